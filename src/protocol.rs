//! Spectator wire protocol.
//!
//! Every packet starts with a one-byte tag. The length of the packet is implied by the tag,
//! except for [`Packet::NewGame`] which carries a length byte right after it. Packets have
//! no checksum: the channel is assumed reliable and ordered.
//!
//! | Packet       | Tag  | Payload                                   |
//! |--------------|------|-------------------------------------------|
//! | `Login`      | 83   | literal `"SHEEP"` (tag included)          |
//! | `Reconnect`  | 71   | literal `"GRASS"` (tag included)          |
//! | `Disconnect` | 87   | literal `"WOLF"` (tag included)           |
//! | `MapRow`     | 10   | one byte per column                       |
//! | `Move`       | 1    | creature id, direction                    |
//! | `EndTurn`    | 2    |                                           |
//! | `NewGame`    | 5    | length byte, `team1;team2`                |
//! | `EndGame`    | 20   | winner (0 for a draw, 1 or 2)             |
//!
//! A stream that ends (or cannot be read) where a packet should start is an implicit
//! `Disconnect`. Any other decoding failure is a [`ProtocolError`] and fatal to the
//! connection: [`PacketReader`] never tries to resynchronize.

use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::{trace, warn};

use crate::board::{Side, TileKind, WIDTH};
use crate::creature::{CreatureId, Move};
use crate::match_state::Outcome;

const LOGIN: &[u8; 5] = b"SHEEP";
const RECONNECT: &[u8; 5] = b"GRASS";
const DISCONNECT: &[u8; 4] = b"WOLF";

const TAG_MOVE: u8 = 1;
const TAG_END_TURN: u8 = 2;
const TAG_NEW_GAME: u8 = 5;
const TAG_MAP_ROW: u8 = 10;
const TAG_END_GAME: u8 = 20;
const TAG_LOGIN: u8 = LOGIN[0];
const TAG_RECONNECT: u8 = RECONNECT[0];
const TAG_DISCONNECT: u8 = DISCONNECT[0];

/// A decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Spectator handshake.
    Login,
    /// Ask the spectator to connect again.
    Reconnect,
    /// End of the connection.
    Disconnect,
    /// One board row, sent in row order when a match starts.
    MapRow([TileKind; WIDTH]),
    /// A completed think step.
    Move {
        /// Creature that thought.
        creature: CreatureId,
        /// The move that was applied.
        direction: Move,
    },
    /// All creatures played this turn.
    EndTurn,
    /// A match between two teams starts.
    NewGame {
        /// Team playing side 1.
        team1: String,
        /// Team playing side 2.
        team2: String,
    },
    /// The match is over.
    EndGame(Outcome),
}

/// Why a packet could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The leading byte is no known packet tag.
    #[error("unexpected packet type: {0}")]
    UnknownTag(u8),
    /// A `Login`, `Reconnect` or `Disconnect` literal was misspelled.
    #[error("malformed handshake, expected \"{}\"", String::from_utf8_lossy(.0))]
    BadHandshake(&'static [u8]),
    /// Creature byte outside `0..4`.
    #[error("invalid creature id: {0}")]
    InvalidCreature(u8),
    /// Direction byte outside `0..5`.
    #[error("invalid direction: {0}")]
    InvalidDirection(u8),
    /// Winner byte other than 0, 1 or 2.
    #[error("invalid winner: {0}")]
    InvalidWinner(u8),
    /// `NewGame` names are not UTF-8, lack the separator or contain a `';'`.
    #[error("team names must be text separated by a single ';'")]
    InvalidTeamNames,
    /// `NewGame` payload (both names and the separator) longer than the length byte allows.
    #[error("team names and separator take {0} bytes, at most 255 fit in a packet")]
    TeamNamesTooLong(usize),
    /// The stream ended inside a packet.
    #[error("packet truncated")]
    Truncated,
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Byte used for `tile` inside a `MapRow` packet.
pub fn tile_to_byte(tile: TileKind) -> u8 {
    match tile {
        TileKind::Grass => b'G',
        TileKind::Rhubarb => b'R',
        TileKind::Sheep(Side::One) => b'1',
        TileKind::Wolf(Side::One) => b'2',
        TileKind::Sheep(Side::Two) => b'3',
        TileKind::Wolf(Side::Two) => b'4',
        TileKind::Fence => b'#',
        TileKind::Empty => b'.',
    }
}

/// Inverse of [`tile_to_byte`]. Unknown bytes are [`TileKind::Empty`].
pub fn byte_to_tile(byte: u8) -> TileKind {
    match byte {
        b'G' => TileKind::Grass,
        b'R' => TileKind::Rhubarb,
        b'1' => TileKind::Sheep(Side::One),
        b'2' => TileKind::Wolf(Side::One),
        b'3' => TileKind::Sheep(Side::Two),
        b'4' => TileKind::Wolf(Side::Two),
        b'#' => TileKind::Fence,
        _ => TileKind::Empty,
    }
}

fn direction_to_byte(mv: Move) -> u8 {
    match mv {
        Move::Wait => 0,
        Move::Up => 1,
        Move::Right => 2,
        Move::Down => 3,
        Move::Left => 4,
    }
}

fn byte_to_direction(byte: u8) -> Result<Move, ProtocolError> {
    Ok(match byte {
        0 => Move::Wait,
        1 => Move::Up,
        2 => Move::Right,
        3 => Move::Down,
        4 => Move::Left,
        _ => return Err(ProtocolError::InvalidDirection(byte)),
    })
}

fn byte_to_creature(byte: u8) -> Result<CreatureId, ProtocolError> {
    CreatureId::ALL
        .get(usize::from(byte))
        .copied()
        .ok_or(ProtocolError::InvalidCreature(byte))
}

fn outcome_to_byte(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Draw => 0,
        Outcome::Winner(side) => side.number(),
    }
}

fn byte_to_outcome(byte: u8) -> Result<Outcome, ProtocolError> {
    Ok(match byte {
        0 => Outcome::Draw,
        1 => Outcome::Winner(Side::One),
        2 => Outcome::Winner(Side::Two),
        _ => return Err(ProtocolError::InvalidWinner(byte)),
    })
}

impl Packet {
    /// The tag byte this packet starts with.
    pub fn tag(&self) -> u8 {
        match self {
            Packet::Login => TAG_LOGIN,
            Packet::Reconnect => TAG_RECONNECT,
            Packet::Disconnect => TAG_DISCONNECT,
            Packet::MapRow(_) => TAG_MAP_ROW,
            Packet::Move { .. } => TAG_MOVE,
            Packet::EndTurn => TAG_END_TURN,
            Packet::NewGame { .. } => TAG_NEW_GAME,
            Packet::EndGame(_) => TAG_END_GAME,
        }
    }

    /// Wire representation.
    ///
    /// # Errors
    /// For a `NewGame` whose team names contain `';'` or do not fit the length byte.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(match self {
            Packet::Login => LOGIN.to_vec(),
            Packet::Reconnect => RECONNECT.to_vec(),
            Packet::Disconnect => DISCONNECT.to_vec(),
            Packet::MapRow(row) => {
                let mut data = Vec::with_capacity(WIDTH + 1);
                data.push(TAG_MAP_ROW);
                data.extend(row.iter().map(|t| tile_to_byte(*t)));
                data
            }
            Packet::Move {
                creature,
                direction,
            } => vec![TAG_MOVE, *creature as u8, direction_to_byte(*direction)],
            Packet::EndTurn => vec![TAG_END_TURN],
            Packet::NewGame { team1, team2 } => {
                if team1.contains(';') || team2.contains(';') {
                    return Err(ProtocolError::InvalidTeamNames);
                }
                let len = team1.len() + 1 + team2.len();
                let len_byte =
                    u8::try_from(len).map_err(|_| ProtocolError::TeamNamesTooLong(len))?;
                let mut data = Vec::with_capacity(len + 2);
                data.extend([TAG_NEW_GAME, len_byte]);
                data.extend(team1.as_bytes());
                data.push(b';');
                data.extend(team2.as_bytes());
                data
            }
            Packet::EndGame(outcome) => vec![TAG_END_GAME, outcome_to_byte(*outcome)],
        })
    }

    /// Decode the packet at the start of `bytes`, returning it with the number of bytes
    /// it took. Empty input is a `Disconnect`.
    pub fn decode(bytes: &[u8]) -> Result<(Packet, usize), ProtocolError> {
        let mut rest = bytes;
        let packet = read_packet(&mut rest)?;
        Ok((packet, bytes.len() - rest.len()))
    }
}

fn eof_is_truncation(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::Truncated,
        _ => ProtocolError::Io(e),
    }
}

fn read_body<R: Read + ?Sized, const N: usize>(reader: &mut R) -> Result<[u8; N], ProtocolError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(eof_is_truncation)?;
    Ok(buf)
}

fn read_literal<R: Read + ?Sized, const N: usize>(
    reader: &mut R,
    literal: &'static [u8; N],
) -> Result<(), ProtocolError> {
    // the tag byte is the first byte of the literal
    let mut rest = vec![0u8; N - 1];
    reader.read_exact(&mut rest).map_err(eof_is_truncation)?;
    if rest != literal[1..] {
        return Err(ProtocolError::BadHandshake(literal));
    }
    Ok(())
}

fn read_leading_byte<R: Read + ?Sized>(reader: &mut R) -> Option<u8> {
    let mut tag = [0u8; 1];
    loop {
        match reader.read(&mut tag) {
            Ok(0) => return None,
            Ok(_) => return Some(tag[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                trace!("unreadable packet start: {e}");
                return None;
            }
        }
    }
}

/// Read exactly one packet from `reader`.
pub fn read_packet<R: Read + ?Sized>(reader: &mut R) -> Result<Packet, ProtocolError> {
    let Some(tag) = read_leading_byte(reader) else {
        return Ok(Packet::Disconnect);
    };
    let packet = match tag {
        TAG_MAP_ROW => {
            let bytes = read_body::<_, WIDTH>(reader)?;
            Packet::MapRow(bytes.map(byte_to_tile))
        }
        TAG_MOVE => {
            let [creature, direction] = read_body::<_, 2>(reader)?;
            Packet::Move {
                creature: byte_to_creature(creature)?,
                direction: byte_to_direction(direction)?,
            }
        }
        TAG_END_TURN => Packet::EndTurn,
        TAG_NEW_GAME => {
            let [len] = read_body::<_, 1>(reader)?;
            let mut names = vec![0u8; usize::from(len)];
            reader.read_exact(&mut names).map_err(eof_is_truncation)?;
            let names = String::from_utf8(names).map_err(|_| ProtocolError::InvalidTeamNames)?;
            let (team1, team2) = names
                .split_once(';')
                .ok_or(ProtocolError::InvalidTeamNames)?;
            Packet::NewGame {
                team1: team1.to_owned(),
                team2: team2.to_owned(),
            }
        }
        TAG_END_GAME => {
            let [winner] = read_body::<_, 1>(reader)?;
            Packet::EndGame(byte_to_outcome(winner)?)
        }
        TAG_LOGIN => {
            read_literal(reader, LOGIN)?;
            Packet::Login
        }
        TAG_RECONNECT => {
            read_literal(reader, RECONNECT)?;
            Packet::Reconnect
        }
        TAG_DISCONNECT => {
            read_literal(reader, DISCONNECT)?;
            Packet::Disconnect
        }
        other => return Err(ProtocolError::UnknownTag(other)),
    };
    Ok(packet)
}

/// Write `packet` and flush.
pub fn write_packet<W: Write + ?Sized>(
    writer: &mut W,
    packet: &Packet,
) -> Result<(), ProtocolError> {
    let data = packet.encode()?;
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

/// Something that consumes the packet stream of a match.
pub trait Spectator {
    /// Deliver one packet. Packets are sent in emission order.
    fn send(&mut self, packet: &Packet) -> anyhow::Result<()>;
}

impl Spectator for Vec<Packet> {
    fn send(&mut self, packet: &Packet) -> anyhow::Result<()> {
        self.push(packet.clone());
        Ok(())
    }
}

impl<S: Spectator + ?Sized> Spectator for Box<S> {
    fn send(&mut self, packet: &Packet) -> anyhow::Result<()> {
        (**self).send(packet)
    }
}

/// Writes packets to a byte stream.
#[derive(Debug)]
pub struct PacketWriter<W: Write> {
    inner: W,
}

impl<W: Write> PacketWriter<W> {
    /// Wrap a byte sink.
    pub fn new(inner: W) -> PacketWriter<W> {
        PacketWriter { inner }
    }

    /// Write one packet and flush.
    pub fn write(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        write_packet(&mut self.inner, packet)
    }

    /// Give the byte sink back.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Spectator for PacketWriter<W> {
    fn send(&mut self, packet: &Packet) -> anyhow::Result<()> {
        Ok(self.write(packet)?)
    }
}

/// Reads packets from a byte stream.
///
/// Errors end the connection: after the first failure (or a `Disconnect`)
/// every call returns `Disconnect` without touching the stream.
#[derive(Debug)]
pub struct PacketReader<R: Read> {
    inner: R,
    closed: bool,
}

impl<R: Read> PacketReader<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> PacketReader<R> {
        PacketReader {
            inner,
            closed: false,
        }
    }

    /// Next packet.
    pub fn recv(&mut self) -> Packet {
        if self.closed {
            return Packet::Disconnect;
        }
        let packet = match read_packet(&mut self.inner) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("protocol error, closing connection: {e}");
                Packet::Disconnect
            }
        };
        if packet == Packet::Disconnect {
            self.closed = true;
        }
        packet
    }

    /// True once a `Disconnect` was returned.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use king_sheep::prelude::*;
use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt,
    layer::{Context, Filter, SubscriberExt},
    Layer, Registry,
};

pub const SHEEP1: Position = Position { row: 1, col: 1 };
pub const WOLF1: Position = Position { row: 1, col: 5 };
pub const SHEEP2: Position = Position { row: 13, col: 17 };
pub const WOLF2: Position = Position { row: 13, col: 13 };
/// Food far from every creature, keeps matches running.
pub const FAR_GRASS: Position = Position { row: 7, col: 9 };

struct DebugOnly;
impl<S> Filter<S> for DebugOnly {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        meta.level() <= &Level::DEBUG
    }
}

pub fn init_debug_logger() {
    let format = fmt::format()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_thread_names(true)
        .with_target(false);

    let reg = Registry::default().with(
        fmt::layer()
            .event_format(format)
            .with_test_writer()
            .with_filter(DebugOnly),
    );

    let _ = tracing::subscriber::set_global_default(reg);
}

/// Empty board with the four creatures at their usual spots and no food.
pub fn bare_board() -> Board {
    let mut board = Board::empty();
    board.set_tile(SHEEP1, TileKind::Sheep(Side::One));
    board.set_tile(WOLF1, TileKind::Wolf(Side::One));
    board.set_tile(SHEEP2, TileKind::Sheep(Side::Two));
    board.set_tile(WOLF2, TileKind::Wolf(Side::Two));
    board
}

/// [`bare_board`] plus one grass nobody reaches.
pub fn board() -> Board {
    let mut board = bare_board();
    board.set_tile(FAR_GRASS, TileKind::Grass);
    board
}

pub fn game(board: Board) -> Match {
    Match::new("one", "two", board).unwrap()
}

pub fn quiet() -> Configuration {
    Configuration::new().with_verbose(false)
}

/// Plays the given moves, then waits forever.
pub struct Script(VecDeque<Move>);

impl Script {
    pub fn new(moves: impl IntoIterator<Item = Move>) -> Script {
        Script(moves.into_iter().collect())
    }
}

impl Agent for Script {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        Ok(self.0.pop_front().unwrap_or(Move::Wait))
    }
}

pub fn idle() -> Script {
    Script::new([])
}

pub fn idle_team() -> TeamAgents {
    TeamAgents::new(idle(), idle())
}

/// Appends its creature id to a shared log every time it thinks.
pub struct Recorder {
    id: CreatureId,
    log: Arc<Mutex<Vec<CreatureId>>>,
}

impl Recorder {
    pub fn new(id: CreatureId, log: &Arc<Mutex<Vec<CreatureId>>>) -> Recorder {
        Recorder {
            id,
            log: Arc::clone(log),
        }
    }
}

impl Agent for Recorder {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        self.log.lock().unwrap().push(self.id);
        Ok(Move::Wait)
    }
}

/// Sleeps, then answers `Up`.
pub struct Sleeper(pub Duration);

impl Agent for Sleeper {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        thread::sleep(self.0);
        Ok(Move::Up)
    }
}

pub struct Panicker;

impl Agent for Panicker {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        panic!("agent bug");
    }
}

pub struct Failing;

impl Agent for Failing {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        anyhow::bail!("no idea what to do")
    }
}

struct Bomb;

impl Drop for Bomb {
    fn drop(&mut self) {
        panic!("panic payload exploded");
    }
}

/// Panics with a payload whose drop panics too, killing the think thread.
pub struct ThreadKiller;

impl Agent for ThreadKiller {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        std::panic::panic_any(Bomb)
    }
}

/// Moves its own creature instead of answering.
pub struct Teleporter;

impl Agent for Teleporter {
    fn think(&mut self, _view: &Board, me: &mut Creature) -> anyhow::Result<Move> {
        me.position = Position::new(7, 7);
        Ok(Move::Wait)
    }
}

/// Spectator whose packets stay readable after the simulator took it.
#[derive(Clone, Default)]
pub struct SharedSpectator(pub Arc<Mutex<Vec<Packet>>>);

impl SharedSpectator {
    pub fn packets(&self) -> Vec<Packet> {
        self.0.lock().unwrap().clone()
    }
}

impl Spectator for SharedSpectator {
    fn send(&mut self, packet: &Packet) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(packet.clone());
        Ok(())
    }
}

/// Accepts `budget` packets, then fails.
pub struct BrokenSpectator {
    pub budget: usize,
}

impl Spectator for BrokenSpectator {
    fn send(&mut self, _packet: &Packet) -> anyhow::Result<()> {
        if self.budget == 0 {
            anyhow::bail!("connection reset");
        }
        self.budget -= 1;
        Ok(())
    }
}

pub fn moves(packets: &[Packet]) -> Vec<(CreatureId, Move)> {
    packets
        .iter()
        .filter_map(|p| match p {
            Packet::Move {
                creature,
                direction,
            } => Some((*creature, *direction)),
            _ => None,
        })
        .collect()
}

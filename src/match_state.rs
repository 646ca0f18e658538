//! State of a single match.
//!
//! [`Match`] groups everything a match mutates (board, scores, creatures, statistics,
//! turn counter, status) so the simulator can work on it without any global state.

use std::{fmt::Display, time::Duration};

use anyhow::bail;

use crate::board::{Board, Side, TileKind};
use crate::creature::{Creature, CreatureId, CreatureKind};
use crate::statistics::Statistics;

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// This side won.
    Winner(Side),
    /// Equal scores.
    Draw,
}

impl Outcome {
    /// Higher score wins, equal scores are a draw.
    pub fn by_score(score1: u32, score2: u32) -> Outcome {
        match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::One),
            std::cmp::Ordering::Less => Outcome::Winner(Side::Two),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

/// When a tampered position was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperPhase {
    /// The creature's position did not match the board before thinking.
    BeforeThink,
    /// The agent changed its creature's position while thinking.
    AfterThink,
}

/// Why a side was disqualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Thinking took longer than the think limit.
    Timeout {
        /// Measured think time.
        elapsed: Duration,
    },
    /// Position cheating.
    Tamper(TamperPhase),
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Timeout { elapsed } => write!(f, "late ({elapsed:?})"),
            Violation::Tamper(TamperPhase::BeforeThink) => write!(f, "tamper (before think)"),
            Violation::Tamper(TamperPhase::AfterThink) => write!(f, "tamper (after think)"),
        }
    }
}

/// A disqualified side and the creature that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disqualification {
    /// The disqualified side.
    pub side: Side,
    /// Creature whose think step broke the rules.
    pub creature: CreatureId,
    /// What it did.
    pub violation: Violation,
}

/// Where a match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Still being played.
    Running,
    /// Decided by the rules of the game.
    Finished(Outcome),
    /// Decided by a violation: the other side wins.
    Disqualified(Disqualification),
}

impl MatchStatus {
    /// True until the match is decided.
    pub fn is_running(&self) -> bool {
        matches!(self, MatchStatus::Running)
    }

    /// `None` while running.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            MatchStatus::Running => None,
            MatchStatus::Finished(outcome) => Some(*outcome),
            MatchStatus::Disqualified(dq) => Some(Outcome::Winner(dq.side.opponent())),
        }
    }
}

/// One side of a match.
#[derive(Debug, Clone)]
pub struct SideState {
    /// Team name.
    pub team: String,
    /// Food points. Never decreases.
    pub score: u32,
    /// The sheep of this side.
    pub sheep: Creature,
    /// The wolf of this side.
    pub wolf: Creature,
    /// Counters for this match.
    pub stats: Statistics,
}

impl SideState {
    /// Sheep or wolf of this side.
    pub fn creature(&self, kind: CreatureKind) -> &Creature {
        match kind {
            CreatureKind::Sheep => &self.sheep,
            CreatureKind::Wolf => &self.wolf,
        }
    }

    /// Mutable sheep or wolf of this side.
    pub fn creature_mut(&mut self, kind: CreatureKind) -> &mut Creature {
        match kind {
            CreatureKind::Sheep => &mut self.sheep,
            CreatureKind::Wolf => &mut self.wolf,
        }
    }
}

/// Everything one match mutates.
#[derive(Debug, Clone)]
pub struct Match {
    /// The authoritative board.
    pub board: Board,
    sides: [SideState; 2],
    /// Number of completed turns.
    pub turn: u32,
    /// Running or how it ended.
    pub status: MatchStatus,
    /// Set when a side got disqualified.
    pub offender: Option<Disqualification>,
}

impl Match {
    /// Set up a match on `board`, placing creatures where the board has their tiles.
    ///
    /// # Errors
    /// When one of the four creatures is missing from the board or appears twice.
    pub fn new(
        team1: impl Into<String>,
        team2: impl Into<String>,
        board: Board,
    ) -> anyhow::Result<Match> {
        let find = |id: CreatureId| -> anyhow::Result<Creature> {
            match board.find(id.tile()).as_slice() {
                [pos] => Ok(Creature::new(id.kind(), id.side(), *pos)),
                [] => bail!("map has no {id}"),
                many => bail!("map has {} {id}", many.len()),
            }
        };
        let side = |team: String, sheep: CreatureId, wolf| -> anyhow::Result<SideState> {
            Ok(SideState {
                stats: Statistics::new(team.clone()),
                team,
                score: 0,
                sheep: find(sheep)?,
                wolf: find(wolf)?,
            })
        };
        let sides = [
            side(team1.into(), CreatureId::Sheep1, CreatureId::Wolf1)?,
            side(team2.into(), CreatureId::Sheep2, CreatureId::Wolf2)?,
        ];

        let mut game = Match {
            board,
            sides,
            turn: 0,
            status: MatchStatus::Running,
            offender: None,
        };
        let grass = game.board.count(TileKind::Grass) as u32;
        let rhubarb = game.board.count(TileKind::Rhubarb) as u32;
        for side in &mut game.sides {
            side.stats.set_totals(grass, rhubarb);
        }
        Ok(game)
    }

    /// State of `side`.
    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    /// Mutable state of `side`.
    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        &mut self.sides[side.index()]
    }

    /// One of the four creatures.
    pub fn creature(&self, id: CreatureId) -> &Creature {
        self.side(id.side()).creature(id.kind())
    }

    /// Mutable access to one of the four creatures.
    pub fn creature_mut(&mut self, id: CreatureId) -> &mut Creature {
        self.side_mut(id.side()).creature_mut(id.kind())
    }

    /// Food points of `side`.
    pub fn score(&self, side: Side) -> u32 {
        self.side(side).score
    }
}

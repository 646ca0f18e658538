//! # King Sheep
//!
//! A referee for King Sheep, a turn-based grid game where two teams of one sheep and one wolf
//! compete for food on a 19 x 15 board.
//!
//! It provides:
//! - Match simulation with per-creature think deadlines and cheat detection (`Simulator`)
//! - A small binary protocol to stream a match to a spectator (`protocol`)
//! - Per-team statistics that fold over a season (`Statistics`)
//! - Team registration and a one-call entry point (`AgentRegistry`, `Referee`)
//!
//! Each think call runs on its own thread with a copy of the board seen from the agent's
//! side. An agent answering too late, or moving its creature by itself, gets its side
//! disqualified. Errors and panics in an agent only cost it the move.
//!
//! # Documentation Overview
//!
//! - To write a team, implement [`Agent`](crate::game_interface::Agent) and
//!   [`TeamFactory`](crate::game_interface::TeamFactory), then register it in an
//!   [`AgentRegistry`](crate::agent_registry::AgentRegistry).
//! - For the game rules and turn order, see the [`simulator`] module.
//! - For the think limit and turn count, see [`rules`]; for stdout and file logging, see
//!   [`Configuration`](crate::configuration::Configuration).
//! - For the wire format, see [`protocol`].
//!
//! # Usage Example
//!
//! ```no_run
//! use std::time::Duration;
//! use king_sheep::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut registry = AgentRegistry::with_builtin_teams();
//!     // a team of two creatures always going up
//!     registry.register("climbers", |_: CreatureKind, _: Side, _: Position| -> Box<dyn Agent> {
//!         Box::new(|_: &Board, _: &mut Creature| -> anyhow::Result<Move> { Ok(Move::Up) })
//!     });
//!
//!     let rules = RulesBuilder::new()
//!         .with_think_limit(Duration::from_millis(200))
//!         .with_max_turns(50)
//!         .build()?;
//!     let referee = Referee::new(registry, Configuration::new(), rules);
//!
//!     let report = referee.play("climbers", "random", Board::load("maps/default.map")?, None)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]

pub use anyhow;

pub mod agent_registry;
pub mod agents;
pub mod board;
pub mod configuration;
pub mod creature;
pub mod game_interface;
mod logger;
pub mod match_state;
pub mod protocol;
pub mod referee;
pub mod rules;
pub mod simulator;
pub mod statistics;
mod think_handler;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use king_sheep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent_registry::AgentRegistry;
    pub use crate::board::{Board, Position, Side, TileKind};
    pub use crate::configuration::Configuration;
    pub use crate::creature::{Creature, CreatureId, CreatureKind, Move};
    pub use crate::game_interface::{Agent, TeamAgents, TeamFactory};
    pub use crate::match_state::{Match, MatchStatus, Outcome};
    pub use crate::protocol::{Packet, PacketReader, PacketWriter, Spectator};
    pub use crate::referee::Referee;
    pub use crate::rules::{Rules, RulesBuilder};
    pub use crate::simulator::{MatchReport, Simulator};
    pub use crate::statistics::Statistics;
}

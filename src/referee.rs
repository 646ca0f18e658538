//! Entry point running matches between registered teams.
//!
//! ```no_run
//! use king_sheep::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let referee = Referee::new(
//!         AgentRegistry::with_builtin_teams(),
//!         Configuration::from_env(),
//!         RulesBuilder::from_env().build()?,
//!     );
//!     let board = Board::load("maps/default.map")?;
//!     let report = referee.play("random", "idle", board, None)?;
//!     report.write_stats(std::io::stdout())?;
//!     Ok(())
//! }
//! ```

use tracing::{instrument, warn};

use crate::agent_registry::AgentRegistry;
use crate::board::Board;
use crate::configuration::Configuration;
use crate::logger::init_logger;
use crate::match_state::Match;
use crate::protocol::Spectator;
use crate::rules::Rules;
use crate::simulator::{MatchReport, Simulator};

/// Runs matches with a fixed registry, configuration and rules.
#[derive(Debug, Clone)]
pub struct Referee {
    registry: AgentRegistry,
    config: Configuration,
    rules: Rules,
}

impl Referee {
    /// Create a referee. Installs the file logger when `config` asks for it.
    pub fn new(registry: AgentRegistry, config: Configuration, rules: Rules) -> Referee {
        if config.log {
            if let Err(e) = init_logger() {
                warn!("file logging disabled: {e:#}");
                if config.verbose {
                    eprintln!("\x1b[33mfile logging disabled: {e:#}\x1b[39m");
                }
            }
        }
        Referee {
            registry,
            config,
            rules,
        }
    }

    /// Play `team1` against `team2` on `board`, streaming to `spectator` if any.
    ///
    /// # Errors
    /// If a team is unknown, the board lacks a creature, or a think thread cannot be
    /// spawned.
    #[instrument(skip(self, board, spectator))]
    pub fn play(
        &self,
        team1: &str,
        team2: &str,
        board: Board,
        spectator: Option<Box<dyn Spectator>>,
    ) -> anyhow::Result<MatchReport> {
        let state = Match::new(team1, team2, board)?;
        let mut simulator = Simulator::from_registry(&self.registry, state)?
            .with_rules(self.rules)
            .with_configuration(self.config);
        if let Some(spectator) = spectator {
            simulator = simulator.with_spectator(spectator);
        }
        let report = simulator.run()?;
        if self.config.verbose {
            println!("\x1b[32m{team1} vs. {team2}: \x1b[39m{report}");
        }
        Ok(report)
    }
}

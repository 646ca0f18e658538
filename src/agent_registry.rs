//! Teams known to the referee, by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::bail;
use tracing::{info, instrument, warn};

use crate::agents::{Idle, RandomWalker};
use crate::board::{Position, Side};
use crate::creature::CreatureKind;
use crate::game_interface::{Agent, TeamAgents, TeamFactory};

/// Maps team names to the factories building their agents.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    teams: BTreeMap<String, Arc<dyn TeamFactory>>,
}

impl AgentRegistry {
    /// An empty registry.
    pub fn new() -> AgentRegistry {
        AgentRegistry::default()
    }

    /// A registry holding the `"idle"` and `"random"` teams.
    pub fn with_builtin_teams() -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        registry.register("idle", |_: CreatureKind, _: Side, _: Position| -> Box<dyn Agent> {
            Box::new(Idle)
        });
        registry.register("random", |_: CreatureKind, _: Side, _: Position| -> Box<dyn Agent> {
            Box::new(RandomWalker::new())
        });
        registry
    }

    /// Register `factory` under `team`, replacing any previous entry.
    pub fn register(&mut self, team: impl Into<String>, factory: impl TeamFactory + 'static) {
        let team = team.into();
        if self.teams.insert(team.clone(), Arc::new(factory)).is_some() {
            warn!("team '{team}' registered twice, keeping the last one");
        }
    }

    /// True if `team` is registered.
    pub fn contains(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    /// Registered team names, sorted.
    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }

    /// Build the sheep and wolf of `team` playing `side`.
    ///
    /// # Errors
    /// If no team has that name.
    #[instrument(skip(self))]
    pub fn instantiate(
        &self,
        team: &str,
        side: Side,
        sheep_start: Position,
        wolf_start: Position,
    ) -> anyhow::Result<TeamAgents> {
        let Some(factory) = self.teams.get(team) else {
            bail!("unknown team '{team}'");
        };
        info!("instantiating agents");
        Ok(TeamAgents {
            sheep: factory.sheep(side, sheep_start),
            wolf: factory.wolf(side, wolf_start),
        })
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.teams.keys()).finish()
    }
}

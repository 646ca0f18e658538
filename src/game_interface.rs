//! Module defining traits that need to be implemented by competing teams

use crate::board::{Board, Position, Side};
use crate::creature::{Creature, CreatureKind, Move};

/// What a sheep or wolf implementation should implement.
///
/// `think` is called on a worker thread with its own copy of the board. It may take
/// too long, return an error or panic: the simulator contains all three.
pub trait Agent: Send {
    /// Decide the next move.
    ///
    /// `view` is the board as seen by this creature's side (it always plays side 1).
    /// `me` is a copy of the creature's own state, with the same perspective.
    ///
    /// Changing `me.position` is considered cheating.
    fn think(&mut self, view: &Board, me: &mut Creature) -> anyhow::Result<Move>;
}

impl<F> Agent for F
where
    F: FnMut(&Board, &mut Creature) -> anyhow::Result<Move> + Send,
{
    fn think(&mut self, view: &Board, me: &mut Creature) -> anyhow::Result<Move> {
        self(view, me)
    }
}

/// What a team provides: one constructor per creature.
pub trait TeamFactory: Send + Sync {
    /// Create the sheep of `side`, starting at `start`.
    fn sheep(&self, side: Side, start: Position) -> Box<dyn Agent>;

    /// Create the wolf of `side`, starting at `start`.
    fn wolf(&self, side: Side, start: Position) -> Box<dyn Agent>;
}

impl<F> TeamFactory for F
where
    F: Fn(CreatureKind, Side, Position) -> Box<dyn Agent> + Send + Sync,
{
    fn sheep(&self, side: Side, start: Position) -> Box<dyn Agent> {
        self(CreatureKind::Sheep, side, start)
    }

    fn wolf(&self, side: Side, start: Position) -> Box<dyn Agent> {
        self(CreatureKind::Wolf, side, start)
    }
}

/// The two agents of one side.
pub struct TeamAgents {
    /// The sheep.
    pub sheep: Box<dyn Agent>,
    /// The wolf.
    pub wolf: Box<dyn Agent>,
}

impl TeamAgents {
    /// Pair two agents.
    pub fn new(sheep: impl Agent + 'static, wolf: impl Agent + 'static) -> TeamAgents {
        TeamAgents {
            sheep: Box::new(sheep),
            wolf: Box::new(wolf),
        }
    }
}

impl std::fmt::Debug for TeamAgents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamAgents").finish_non_exhaustive()
    }
}

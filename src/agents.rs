//! Built-in agents, useful as sparring partners.

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::board::Board;
use crate::creature::{Creature, Move};
use crate::game_interface::Agent;

/// Never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Agent for Idle {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        Ok(Move::Wait)
    }
}

/// Picks one of the four directions at random every turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalker;

impl RandomWalker {
    /// A new random walker.
    pub fn new() -> RandomWalker {
        RandomWalker
    }
}

impl Agent for RandomWalker {
    fn think(&mut self, _view: &Board, _me: &mut Creature) -> anyhow::Result<Move> {
        const DIRECTIONS: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
        Ok(*DIRECTIONS
            .choose(&mut thread_rng())
            .unwrap_or(&Move::Wait))
    }
}

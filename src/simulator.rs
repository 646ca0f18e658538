//! The match simulator.
//!
//! A [`Simulator`] owns a [`Match`] and the four agents playing it. Each turn visits the
//! creatures in [`TURN_ORDER`]: both sheep think twice before either wolf thinks once.
//! For every living creature the simulator
//!
//! 1. checks the creature's cached position against the board,
//! 2. runs its agent on a worker thread with a copy of the board seen from its side,
//! 3. disqualifies the side if the think took longer than the think limit,
//! 4. checks that the agent did not move its creature by itself,
//! 5. applies the move (illegal moves become [`Move::Wait`]),
//! 6. resolves food and kills, then checks whether the match is decided.
//!
//! Spectator packets are emitted along the way: `NewGame` and the map rows when the first
//! turn starts, one `Move` per think step, one `EndTurn` per turn and `EndGame` once the
//! match is over.

use std::fmt::Display;
use std::io::Write;

use anyhow::{bail, Context};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::agent_registry::AgentRegistry;
use crate::agents::Idle;
use crate::board::{Board, Side, TileKind};
use crate::configuration::Configuration;
use crate::creature::{CreatureId, CreatureKind, Move};
use crate::game_interface::{Agent, TeamAgents};
use crate::match_state::{
    Disqualification, Match, MatchStatus, Outcome, TamperPhase, Violation,
};
use crate::protocol::{Packet, Spectator};
use crate::rules::Rules;
use crate::statistics::Statistics;
use crate::think_handler::{self, ThinkResult};

/// Creatures in the order they think during one turn.
pub const TURN_ORDER: [CreatureId; 6] = [
    CreatureId::Sheep1,
    CreatureId::Sheep2,
    CreatureId::Sheep1,
    CreatureId::Sheep2,
    CreatureId::Wolf1,
    CreatureId::Wolf2,
];

/// True if a creature on tile `mover` may step onto tile `target`.
///
/// Fences block everyone. Sheep cannot step onto any creature, wolves cannot step onto
/// another wolf or onto their own sheep. A wolf stepping onto the opposing sheep eats it.
pub fn is_legal_move(mover: TileKind, target: TileKind) -> bool {
    match (mover, target) {
        (_, TileKind::Fence) => false,
        (TileKind::Sheep(_), TileKind::Sheep(_) | TileKind::Wolf(_)) => false,
        (TileKind::Wolf(_), TileKind::Wolf(_)) => false,
        (TileKind::Wolf(wolf_side), TileKind::Sheep(sheep_side)) => wolf_side != sheep_side,
        _ => true,
    }
}

/// Runs one match.
pub struct Simulator {
    state: Match,
    agents: [Option<Box<dyn Agent>>; 4],
    rules: Rules,
    config: Configuration,
    spectator: Option<Box<dyn Spectator>>,
    announced: bool,
    concluded: bool,
}

impl Simulator {
    /// Simulate `state` with the agents of both sides, standard rules, nothing printed to
    /// stdout and no spectator.
    pub fn new(state: Match, teams: [TeamAgents; 2]) -> Simulator {
        let [team1, team2] = teams;
        Simulator {
            state,
            // indexed by `CreatureId as usize`
            agents: [
                Some(team1.sheep),
                Some(team1.wolf),
                Some(team2.sheep),
                Some(team2.wolf),
            ],
            rules: Rules::default(),
            config: Configuration::new().with_verbose(false),
            spectator: None,
            announced: false,
            concluded: false,
        }
    }

    /// Instantiate both teams of `state` from `registry`.
    ///
    /// # Errors
    /// If a team is not registered.
    pub fn from_registry(registry: &AgentRegistry, state: Match) -> anyhow::Result<Simulator> {
        let mut teams = Vec::with_capacity(2);
        for side in Side::BOTH {
            let s = state.side(side);
            let agents = registry
                .instantiate(&s.team, side, s.sheep.position, s.wolf.position)
                .with_context(|| format!("could not load team of {side}"))?;
            teams.push(agents);
        }
        let Ok(teams) = <[TeamAgents; 2]>::try_from(teams) else {
            bail!("expected two teams");
        };
        Ok(Simulator::new(state, teams))
    }

    /// Play under `rules`.
    pub fn with_rules(mut self, rules: Rules) -> Simulator {
        self.rules = rules;
        self
    }

    /// Set stdout reporting.
    pub fn with_configuration(mut self, config: Configuration) -> Simulator {
        self.config = config;
        self
    }

    /// Stream the match to `spectator`.
    pub fn with_spectator(mut self, spectator: impl Spectator + 'static) -> Simulator {
        self.spectator = Some(Box::new(spectator));
        self
    }

    /// The match as it stands.
    pub fn state(&self) -> &Match {
        &self.state
    }

    /// True while a spectator is attached and has not failed.
    pub fn has_spectator(&self) -> bool {
        self.spectator.is_some()
    }

    /// Play the match to its end.
    ///
    /// # Errors
    /// Only when a think thread cannot be spawned.
    #[instrument(
        skip_all,
        fields(
            team1 = %self.state.side(Side::One).team,
            team2 = %self.state.side(Side::Two).team
        )
    )]
    pub fn run(mut self) -> anyhow::Result<MatchReport> {
        while self.state.status.is_running() {
            self.play_turn()?;
        }
        self.conclude();
        Ok(self.into_report())
    }

    /// Play one full turn, returning the status afterwards. Does nothing once the match is
    /// decided.
    ///
    /// # Errors
    /// Only when a think thread cannot be spawned.
    pub fn play_turn(&mut self) -> anyhow::Result<MatchStatus> {
        if !self.state.status.is_running() {
            return Ok(self.state.status);
        }
        self.announce();
        trace!(turn = self.state.turn, "turn start");

        for id in TURN_ORDER {
            if !self.state.creature(id).alive {
                continue;
            }
            self.think_step(id)?;
            if !self.state.status.is_running() {
                break;
            }
        }
        self.emit(Packet::EndTurn);
        self.state.turn += 1;

        if self.state.status.is_running() && self.state.turn >= self.rules.max_turns() {
            debug!("turn limit reached");
            self.state.status = MatchStatus::Finished(self.by_score());
        }
        if !self.state.status.is_running() {
            self.conclude();
        }
        Ok(self.state.status)
    }

    fn announce(&mut self) {
        if self.announced {
            return;
        }
        self.announced = true;
        info!(
            "new game: {} vs. {}",
            self.state.side(Side::One).team,
            self.state.side(Side::Two).team
        );
        self.emit(Packet::NewGame {
            team1: self.state.side(Side::One).team.clone(),
            team2: self.state.side(Side::Two).team.clone(),
        });
        let rows: Vec<_> = self.state.board.rows().copied().collect();
        for row in rows {
            self.emit(Packet::MapRow(row));
        }
    }

    fn think_step(&mut self, id: CreatureId) -> anyhow::Result<()> {
        let side = id.side();
        let cached = self.state.creature(id).clone();

        if self.state.board.get(cached.position) != Some(cached.tile()) {
            self.disqualify(id, Violation::Tamper(TamperPhase::BeforeThink));
            return Ok(());
        }

        let Some(agent) = self.agents[id as usize].take() else {
            bail!("{id} has no agent left");
        };
        let view = self.state.board.perspective_view(side);
        let result = think_handler::think(
            id,
            agent,
            view,
            cached.perspective_view(),
            self.rules.deadline(),
        )?;
        self.state.side_mut(side).stats.think(result.elapsed());

        let requested = match result {
            ThinkResult::TimedOut { elapsed } => {
                self.disqualify(id, Violation::Timeout { elapsed });
                return Ok(());
            }
            ThinkResult::Crashed { .. } => {
                warn!(
                    team = %self.state.side(side).team,
                    creature = %id,
                    "think thread died, agent replaced by an idle one"
                );
                self.agents[id as usize] = Some(Box::new(Idle));
                Move::Wait
            }
            ThinkResult::Completed {
                agent,
                creature,
                reply,
                elapsed,
            } => {
                self.agents[id as usize] = Some(agent);
                if elapsed > self.rules.think_limit() {
                    self.disqualify(id, Violation::Timeout { elapsed });
                    return Ok(());
                }
                if creature.position != cached.position {
                    self.disqualify(id, Violation::Tamper(TamperPhase::AfterThink));
                    return Ok(());
                }
                match reply {
                    Ok(mv) => mv,
                    Err(e) => {
                        warn!(
                            team = %self.state.side(side).team,
                            creature = %id,
                            "think fault: {e:#}"
                        );
                        Move::Wait
                    }
                }
            }
        };

        let applied = self.apply_move(id, requested);
        debug!(creature = %id, ?requested, ?applied);
        self.emit(Packet::Move {
            creature: id,
            direction: applied,
        });

        if let Some(outcome) = self.check_sheep().or_else(|| self.check_food()) {
            self.state.status = MatchStatus::Finished(outcome);
        }
        Ok(())
    }

    /// Move `id` if the move is legal, resolving what it lands on. Returns the move
    /// actually made.
    fn apply_move(&mut self, id: CreatureId, requested: Move) -> Move {
        let side = id.side();
        let mover = id.tile();
        let from = self.state.creature(id).position;

        let target = match from.step(requested) {
            Some(target) if requested != Move::Wait => target,
            _ => {
                self.state.creature_mut(id).pending_move = Move::Wait;
                return Move::Wait;
            }
        };
        let landing = self.state.board.tile_at(target);
        if !is_legal_move(mover, landing) {
            self.state.creature_mut(id).pending_move = Move::Wait;
            return Move::Wait;
        }

        self.state.board.set_tile(from, TileKind::Empty);
        let creature = self.state.creature_mut(id);
        creature.position = target;
        creature.pending_move = requested;

        let own = self.state.side_mut(side);
        match (id.kind(), landing) {
            (CreatureKind::Sheep, TileKind::Grass) => {
                own.score += 1;
                own.stats.eat_grass();
            }
            (CreatureKind::Sheep, TileKind::Rhubarb) => {
                own.score += 5;
                own.stats.eat_rhubarb();
            }
            (CreatureKind::Wolf, TileKind::Grass) => own.stats.crush_grass(),
            (CreatureKind::Wolf, TileKind::Rhubarb) => own.stats.crush_rhubarb(),
            (CreatureKind::Wolf, TileKind::Sheep(victim)) => {
                own.stats.eat_sheep();
                self.state.side_mut(victim).sheep.alive = false;
                info!("{id} ate the sheep of {victim}");
            }
            _ => {}
        }
        self.state.board.set_tile(target, mover);
        requested
    }

    /// A dead sheep whose side is behind loses the match. Two dead sheep end it by score.
    fn check_sheep(&self) -> Option<Outcome> {
        let (one, two) = (self.state.side(Side::One), self.state.side(Side::Two));
        if !one.sheep.alive && one.score < two.score {
            Some(Outcome::Winner(Side::Two))
        } else if !two.sheep.alive && two.score < one.score {
            Some(Outcome::Winner(Side::One))
        } else if !one.sheep.alive && !two.sheep.alive {
            Some(self.by_score())
        } else {
            None
        }
    }

    fn check_food(&self) -> Option<Outcome> {
        (!self.state.board.food_left()).then(|| self.by_score())
    }

    fn by_score(&self) -> Outcome {
        Outcome::by_score(self.state.score(Side::One), self.state.score(Side::Two))
    }

    fn disqualify(&mut self, id: CreatureId, violation: Violation) {
        let side = id.side();
        self.state.creature_mut(id).pending_move = Move::Wait;
        let team = &self.state.side(side).team;
        warn!(team = %team, creature = %id, %violation, "DISQUALIFIED");
        if self.config.verbose {
            let reason = match violation {
                Violation::Timeout { .. } => {
                    format!("used over {:?}!", self.rules.think_limit())
                }
                Violation::Tamper(_) => "has cheated!".to_owned(),
            };
            println!("\x1b[31m{team} {reason} DISQUALIFIED!\x1b[39m");
        }
        let dq = Disqualification {
            side,
            creature: id,
            violation,
        };
        self.state.offender = Some(dq);
        self.state.status = MatchStatus::Disqualified(dq);
    }

    /// Fold the outcome into statistics and send `EndGame`. Runs once.
    fn conclude(&mut self) {
        if self.concluded {
            return;
        }
        let Some(outcome) = self.state.status.outcome() else {
            return;
        };
        self.concluded = true;
        self.announce();

        match outcome {
            Outcome::Winner(side) => {
                self.state.side_mut(side).stats.win();
                self.state.side_mut(side.opponent()).stats.lose();
            }
            Outcome::Draw => {
                self.state.side_mut(Side::One).stats.draw();
                self.state.side_mut(Side::Two).stats.draw();
            }
        }
        if let Some(dq) = self.state.offender {
            self.state.side_mut(dq.side).stats.disqualify();
        }
        info!(
            ?outcome,
            score1 = self.state.score(Side::One),
            score2 = self.state.score(Side::Two),
            turns = self.state.turn,
            "game over"
        );
        self.emit(Packet::EndGame(outcome));
    }

    fn emit(&mut self, packet: Packet) {
        let Some(spectator) = self.spectator.as_mut() else {
            return;
        };
        if let Err(e) = spectator.send(&packet) {
            error!("could not send {packet:?} to spectator, continuing without: {e:#}");
            self.spectator = None;
        }
    }

    fn into_report(self) -> MatchReport {
        let state = self.state;
        let outcome = state.status.outcome().unwrap_or(Outcome::Draw);
        let one = state.side(Side::One).clone();
        let two = state.side(Side::Two).clone();
        MatchReport {
            team1: one.team,
            team2: two.team,
            score1: one.score,
            score2: two.score,
            outcome,
            disqualification: state.offender,
            stats1: one.stats,
            stats2: two.stats,
            turns: state.turn,
            board: state.board,
        }
    }
}

/// What the season layer reads back after a match.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// Team of side 1.
    pub team1: String,
    /// Team of side 2.
    pub team2: String,
    /// Final score of side 1.
    pub score1: u32,
    /// Final score of side 2.
    pub score2: u32,
    /// Who won.
    pub outcome: Outcome,
    /// Set when the match was decided by a violation.
    pub disqualification: Option<Disqualification>,
    /// Match statistics of side 1.
    pub stats1: Statistics,
    /// Match statistics of side 2.
    pub stats2: Statistics,
    /// Turns played, including the one the match ended in.
    pub turns: u32,
    /// Board at the end of the match.
    pub board: Board,
}

impl MatchReport {
    /// Match statistics of `side`.
    pub fn stats(&self, side: Side) -> &Statistics {
        match side {
            Side::One => &self.stats1,
            Side::Two => &self.stats2,
        }
    }

    /// Final score of `side`.
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::One => self.score1,
            Side::Two => self.score2,
        }
    }

    /// Append one statistics record per team.
    pub fn write_stats<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{}", self.stats1.to_record())?;
        writeln!(writer, "{}", self.stats2.to_record())?;
        writer.flush()
    }
}

impl Display for MatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            Outcome::Winner(Side::One) => {
                write!(f, "{} won {} - {}.", self.team1, self.score1, self.score2)?
            }
            Outcome::Winner(Side::Two) => {
                write!(f, "{} won {} - {}.", self.team2, self.score2, self.score1)?
            }
            Outcome::Draw => write!(f, "It's a draw {} - {}.", self.score1, self.score2)?,
        }
        if let Some(dq) = &self.disqualification {
            let team = match dq.side {
                Side::One => &self.team1,
                Side::Two => &self.team2,
            };
            write!(f, " ({team} disqualified: {})", dq.violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legality_table() {
        use crate::board::Side::{One, Two};
        use TileKind::*;

        for mover in [Sheep(One), Sheep(Two), Wolf(One), Wolf(Two)] {
            assert!(!is_legal_move(mover, Fence));
            assert!(is_legal_move(mover, Empty));
            assert!(is_legal_move(mover, Grass));
            assert!(is_legal_move(mover, Rhubarb));
        }
        assert!(!is_legal_move(Sheep(One), Sheep(Two)));
        assert!(!is_legal_move(Sheep(Two), Sheep(One)));
        assert!(!is_legal_move(Sheep(One), Wolf(One)));
        assert!(!is_legal_move(Sheep(One), Wolf(Two)));
        assert!(!is_legal_move(Wolf(One), Wolf(Two)));
        assert!(!is_legal_move(Wolf(Two), Wolf(One)));
        assert!(!is_legal_move(Wolf(One), Sheep(One)));
        assert!(!is_legal_move(Wolf(Two), Sheep(Two)));
        assert!(is_legal_move(Wolf(One), Sheep(Two)));
        assert!(is_legal_move(Wolf(Two), Sheep(One)));
    }

    #[test]
    fn sheep_think_twice_before_wolves() {
        let sheep_slots = TURN_ORDER
            .iter()
            .take_while(|id| id.kind() == CreatureKind::Sheep)
            .count();
        assert_eq!(sheep_slots, 4);
        assert_eq!(&TURN_ORDER[4..], &[CreatureId::Wolf1, CreatureId::Wolf2]);
    }
}

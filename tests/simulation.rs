use std::sync::{Arc, Mutex};
use std::time::Duration;

use king_sheep::match_state::{TamperPhase, Violation};
use king_sheep::prelude::*;
use king_sheep::simulator::TURN_ORDER;

use crate::agents::*;

mod agents;

fn simulator(state: Match, team1: TeamAgents, team2: TeamAgents) -> Simulator {
    Simulator::new(state, [team1, team2]).with_configuration(quiet())
}

#[test]
fn sheep_eats_adjacent_grass() {
    init_debug_logger();
    let mut board = bare_board();
    let grass = Position::new(SHEEP1.row, SHEEP1.col + 1);
    board.set_tile(grass, TileKind::Grass);

    let mut sim = simulator(
        game(board),
        TeamAgents::new(Script::new([Move::Right]), idle()),
        idle_team(),
    );
    let status = sim.play_turn().unwrap();

    let state = sim.state();
    assert_eq!(state.score(Side::One), 1);
    assert_eq!(state.board.tile_at(grass), TileKind::Sheep(Side::One));
    assert_eq!(state.board.tile_at(SHEEP1), TileKind::Empty);
    assert_eq!(state.creature(CreatureId::Sheep1).position, grass);
    assert_eq!(state.side(Side::One).stats.grass_eaten, 1);
    // that was the only food
    assert_eq!(status, MatchStatus::Finished(Outcome::Winner(Side::One)));
}

#[test]
fn no_food_is_a_draw_on_the_first_turn() {
    let spectator = SharedSpectator::default();
    let mut sim = simulator(game(bare_board()), idle_team(), idle_team())
        .with_spectator(spectator.clone());

    let status = sim.play_turn().unwrap();
    assert_eq!(status, MatchStatus::Finished(Outcome::Draw));
    assert_eq!(sim.state().turn, 1);

    // the match ends after the very first think step
    assert_eq!(moves(&spectator.packets()), [(CreatureId::Sheep1, Move::Wait)]);

    let report = sim.run().unwrap();
    assert_eq!(report.outcome, Outcome::Draw);
    assert_eq!((report.score1, report.score2), (0, 0));
    assert_eq!(report.stats1.draws, 1);
    assert_eq!(report.stats2.draws, 1);
}

#[test]
fn wolf_eating_a_sheep_that_is_behind_wins() {
    let mut board = bare_board();
    let grass = Position::new(SHEEP1.row, SHEEP1.col + 1);
    board.set_tile(grass, TileKind::Grass);
    board.set_tile(FAR_GRASS, TileKind::Grass);
    // wolf 1 right next to sheep 2
    board.set_tile(WOLF1, TileKind::Empty);
    let attacker = Position::new(SHEEP2.row, SHEEP2.col - 1);
    board.set_tile(attacker, TileKind::Wolf(Side::One));

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = simulator(
        game(board),
        TeamAgents::new(Script::new([Move::Right]), Script::new([Move::Right])),
        TeamAgents::new(idle(), Recorder::new(CreatureId::Wolf2, &log)),
    );
    let status = sim.play_turn().unwrap();

    assert_eq!(status, MatchStatus::Finished(Outcome::Winner(Side::One)));
    let state = sim.state();
    assert!(!state.side(Side::Two).sheep.alive);
    assert_eq!(state.side(Side::One).stats.sheep_eaten, 1);
    assert_eq!(state.board.tile_at(SHEEP2), TileKind::Wolf(Side::One));
    assert_eq!(state.board.tile_at(attacker), TileKind::Empty);
    assert_eq!(state.board.count(TileKind::Sheep(Side::Two)), 0);
    // the match ended before wolf 2 got to think
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn dead_sheep_that_is_not_behind_keeps_the_match_going() {
    let mut board = bare_board();
    board.set_tile(FAR_GRASS, TileKind::Grass);
    board.set_tile(WOLF1, TileKind::Empty);
    board.set_tile(Position::new(SHEEP2.row, SHEEP2.col - 1), TileKind::Wolf(Side::One));

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = simulator(
        game(board),
        TeamAgents::new(idle(), Script::new([Move::Right])),
        TeamAgents::new(Recorder::new(CreatureId::Sheep2, &log), idle()),
    );
    assert!(sim.play_turn().unwrap().is_running());
    sim.play_turn().unwrap();

    // sheep 2 thought twice in the first turn and never after its death
    assert_eq!(*log.lock().unwrap(), [CreatureId::Sheep2, CreatureId::Sheep2]);
    assert!(!sim.state().creature(CreatureId::Sheep2).alive);
}

#[test]
fn turn_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let team = |sheep, wolf| {
        TeamAgents::new(Recorder::new(sheep, &log), Recorder::new(wolf, &log))
    };
    let mut sim = simulator(
        game(board()),
        team(CreatureId::Sheep1, CreatureId::Wolf1),
        team(CreatureId::Sheep2, CreatureId::Wolf2),
    );
    assert!(sim.play_turn().unwrap().is_running());
    assert_eq!(*log.lock().unwrap(), TURN_ORDER);
    assert_eq!(
        *log.lock().unwrap(),
        [
            CreatureId::Sheep1,
            CreatureId::Sheep2,
            CreatureId::Sheep1,
            CreatureId::Sheep2,
            CreatureId::Wolf1,
            CreatureId::Wolf2,
        ]
    );
}

fn short_rules(limit_ms: u64, grace_ms: u64) -> Rules {
    RulesBuilder::new()
        .with_think_limit(Duration::from_millis(limit_ms))
        .with_grace(Duration::from_millis(grace_ms))
        .build()
        .unwrap()
}

#[test]
fn late_agent_is_disqualified() {
    let spectator = SharedSpectator::default();
    let sim = simulator(
        game(board()),
        TeamAgents::new(Sleeper(Duration::from_millis(500)), idle()),
        idle_team(),
    )
    .with_rules(short_rules(50, 10))
    .with_spectator(spectator.clone());

    let report = sim.run().unwrap();
    assert_eq!(report.outcome, Outcome::Winner(Side::Two));
    let dq = report.disqualification.unwrap();
    assert_eq!(dq.side, Side::One);
    assert_eq!(dq.creature, CreatureId::Sheep1);
    assert!(matches!(
        dq.violation,
        Violation::Timeout { elapsed } if elapsed >= Duration::from_millis(50)
    ));

    assert_eq!(report.stats1.disqualifications, 1);
    assert_eq!(report.stats1.games_lost, 1);
    assert_eq!(report.stats2.games_won, 1);
    assert_eq!(report.stats2.disqualifications, 0);
    // the late move is never applied
    assert_eq!(report.board.tile_at(SHEEP1), TileKind::Sheep(Side::One));

    let packets = spectator.packets();
    assert!(moves(&packets).is_empty());
    assert_eq!(packets[packets.len() - 2], Packet::EndTurn);
    assert_eq!(packets.last(), Some(&Packet::EndGame(Outcome::Winner(Side::Two))));
}

#[test]
fn reply_within_grace_is_still_late() {
    let sim = simulator(
        game(board()),
        idle_team(),
        TeamAgents::new(idle(), Sleeper(Duration::from_millis(150))),
    )
    .with_rules(short_rules(50, 1000));

    let report = sim.run().unwrap();
    assert_eq!(report.outcome, Outcome::Winner(Side::One));
    let dq = report.disqualification.unwrap();
    assert_eq!(dq.creature, CreatureId::Wolf2);
    assert!(matches!(dq.violation, Violation::Timeout { .. }));
    assert_eq!(report.board.tile_at(WOLF2), TileKind::Wolf(Side::Two));
}

#[test]
fn tampered_position_is_caught_before_thinking() {
    let mut state = game(board());
    state.creature_mut(CreatureId::Sheep1).position = Position::new(2, 2);

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = simulator(
        state,
        TeamAgents::new(Recorder::new(CreatureId::Sheep1, &log), idle()),
        idle_team(),
    );
    let status = sim.play_turn().unwrap();

    let MatchStatus::Disqualified(dq) = status else {
        panic!("expected a disqualification, got {status:?}");
    };
    assert_eq!(dq.side, Side::One);
    assert_eq!(dq.violation, Violation::Tamper(TamperPhase::BeforeThink));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(sim.state().offender, Some(dq));
}

#[test]
fn agent_moving_its_creature_is_disqualified() {
    let mut sim = simulator(
        game(board()),
        idle_team(),
        TeamAgents::new(Teleporter, idle()),
    );
    let status = sim.play_turn().unwrap();

    let MatchStatus::Disqualified(dq) = status else {
        panic!("expected a disqualification, got {status:?}");
    };
    assert_eq!(dq.creature, CreatureId::Sheep2);
    assert_eq!(dq.violation, Violation::Tamper(TamperPhase::AfterThink));
    assert_eq!(status.outcome(), Some(Outcome::Winner(Side::One)));
    assert_eq!(sim.state().creature(CreatureId::Sheep2).position, SHEEP2);
}

#[test]
fn disqualification_is_final() {
    let mut state = game(board());
    state.creature_mut(CreatureId::Wolf2).position = Position::new(0, 0);

    let mut sim = simulator(state, idle_team(), idle_team());
    let status = sim.play_turn().unwrap();
    assert!(matches!(status, MatchStatus::Disqualified(dq) if dq.creature == CreatureId::Wolf2));
    // later turns change nothing
    assert_eq!(sim.play_turn().unwrap(), status);
    assert_eq!(sim.state().turn, 1);

    let report = sim.run().unwrap();
    assert_eq!(report.outcome, Outcome::Winner(Side::One));
    assert_eq!(report.stats2.disqualifications, 1);
    assert_eq!(report.stats2.games_lost, 1);
    assert_eq!(report.stats1.games_won, 1);
}

#[test]
fn faults_only_cost_the_move() {
    let spectator = SharedSpectator::default();
    let mut sim = simulator(
        game(board()),
        TeamAgents::new(Panicker, Failing),
        idle_team(),
    )
    .with_spectator(spectator.clone());

    assert!(sim.play_turn().unwrap().is_running());
    assert!(sim.play_turn().unwrap().is_running());
    assert_eq!(sim.state().creature(CreatureId::Sheep1).position, SHEEP1);
    assert_eq!(sim.state().creature(CreatureId::Wolf1).position, WOLF1);
    assert!(sim.state().offender.is_none());

    let moves = moves(&spectator.packets());
    assert_eq!(moves.len(), 12);
    assert!(moves.iter().all(|(_, mv)| *mv == Move::Wait));
}

#[test]
fn dead_think_thread_leaves_an_idle_creature() {
    let spectator = SharedSpectator::default();
    let mut sim = simulator(
        game(board()),
        TeamAgents::new(ThreadKiller, idle()),
        idle_team(),
    )
    .with_spectator(spectator.clone());

    assert!(sim.play_turn().unwrap().is_running());
    assert!(sim.play_turn().unwrap().is_running());
    assert!(sim.state().offender.is_none());
    assert_eq!(sim.state().creature(CreatureId::Sheep1).position, SHEEP1);

    let moves = moves(&spectator.packets());
    assert_eq!(moves.len(), 12);
    let sheep1: Vec<_> = moves.iter().filter(|(id, _)| *id == CreatureId::Sheep1).collect();
    assert_eq!(sheep1.len(), 4);
    assert!(sheep1.iter().all(|(_, mv)| *mv == Move::Wait));
}

#[test]
fn illegal_moves_become_wait() {
    let mut board = board();
    board.set_tile(Position::new(SHEEP1.row, SHEEP1.col + 1), TileKind::Fence);
    // wolf 2 just left of sheep 2
    board.set_tile(WOLF2, TileKind::Empty);
    let wolf2 = Position::new(SHEEP2.row, SHEEP2.col - 1);
    board.set_tile(wolf2, TileKind::Wolf(Side::Two));

    let spectator = SharedSpectator::default();
    let mut sim = simulator(
        game(board),
        TeamAgents::new(Script::new([Move::Right, Move::Up, Move::Up]), idle()),
        // sheep onto its own wolf, wolf onto its own sheep
        TeamAgents::new(Script::new([Move::Left]), Script::new([Move::Right])),
    )
    .with_spectator(spectator.clone());

    sim.play_turn().unwrap();
    sim.play_turn().unwrap();

    let state = sim.state();
    assert_eq!(state.creature(CreatureId::Sheep1).position, Position::new(0, 1));
    assert_eq!(state.creature(CreatureId::Sheep2).position, SHEEP2);
    assert_eq!(state.creature(CreatureId::Wolf2).position, wolf2);
    assert!(state.side(Side::Two).sheep.alive);

    let moves = moves(&spectator.packets());
    assert_eq!(moves[0], (CreatureId::Sheep1, Move::Wait)); // fence
    assert_eq!(moves[1], (CreatureId::Sheep2, Move::Wait)); // own wolf
    assert_eq!(moves[2], (CreatureId::Sheep1, Move::Up));
    assert_eq!(moves[5], (CreatureId::Wolf2, Move::Wait)); // own sheep
    assert_eq!(moves[6], (CreatureId::Sheep1, Move::Wait)); // off the grid
}

#[test]
fn wolf_crushes_food_without_scoring() {
    let mut board = board();
    board.set_tile(Position::new(WOLF1.row, WOLF1.col + 1), TileKind::Rhubarb);
    let mut sim = simulator(
        game(board),
        TeamAgents::new(idle(), Script::new([Move::Right])),
        idle_team(),
    );
    sim.play_turn().unwrap();

    let state = sim.state();
    assert_eq!(state.score(Side::One), 0);
    assert_eq!(state.side(Side::One).stats.rhubarb_crushed, 1);
    assert_eq!(state.side(Side::One).stats.rhubarb_eaten, 0);
    assert_eq!(state.board.count(TileKind::Rhubarb), 0);
}

#[test]
fn sheep_death_ends_the_match_while_food_remains() {
    let mut board = bare_board();
    let grass = Position::new(SHEEP1.row, SHEEP1.col + 1);
    board.set_tile(grass, TileKind::Grass);
    board.set_tile(WOLF1, TileKind::Empty);
    let attacker = Position::new(SHEEP2.row, SHEEP2.col - 1);
    board.set_tile(attacker, TileKind::Wolf(Side::One));
    board.set_tile(Position::new(SHEEP2.row - 1, SHEEP2.col), TileKind::Grass);

    let mut sim = simulator(
        game(board),
        TeamAgents::new(Script::new([Move::Right]), Script::new([Move::Right])),
        // sheep 2 ignores the grass above it
        idle_team(),
    );
    let status = sim.play_turn().unwrap();
    assert_eq!(status, MatchStatus::Finished(Outcome::Winner(Side::One)));
    assert!(sim.state().board.food_left());
    assert!(!sim.state().creature(CreatureId::Sheep2).alive);
}

#[test]
fn last_food_eaten_after_a_sheep_died() {
    let mut board = bare_board();
    let grass = Position::new(SHEEP1.row, SHEEP1.col + 1);
    board.set_tile(grass, TileKind::Grass);
    board.set_tile(WOLF1, TileKind::Empty);
    board.set_tile(Position::new(SHEEP2.row, SHEEP2.col - 1), TileKind::Wolf(Side::One));

    let mut sim = simulator(
        game(board),
        TeamAgents::new(
            Script::new([Move::Wait, Move::Wait, Move::Right]),
            Script::new([Move::Right]),
        ),
        idle_team(),
    );
    // sheep 2 dies at 0 - 0, side 2 is not behind yet
    assert!(sim.play_turn().unwrap().is_running());
    assert!(!sim.state().creature(CreatureId::Sheep2).alive);
    assert!(sim.state().board.food_left());

    // the same move leaves side 2 behind and eats the last food
    let status = sim.play_turn().unwrap();
    assert_eq!(status, MatchStatus::Finished(Outcome::Winner(Side::One)));
    let state = sim.state();
    assert_eq!(state.turn, 2);
    assert!(!state.board.food_left());
    assert_eq!((state.score(Side::One), state.score(Side::Two)), (1, 0));
    assert_eq!(state.creature(CreatureId::Sheep1).position, grass);
}

#[test]
fn both_sheep_dead_is_decided_by_score() {
    let mut board = board();
    board.set_tile(WOLF1, TileKind::Empty);
    board.set_tile(WOLF2, TileKind::Empty);
    board.set_tile(Position::new(SHEEP2.row, SHEEP2.col - 1), TileKind::Wolf(Side::One));
    board.set_tile(Position::new(SHEEP1.row, SHEEP1.col + 1), TileKind::Wolf(Side::Two));

    let mut sim = simulator(
        game(board),
        TeamAgents::new(idle(), Script::new([Move::Right])),
        TeamAgents::new(idle(), Script::new([Move::Left])),
    );
    let status = sim.play_turn().unwrap();
    assert_eq!(status, MatchStatus::Finished(Outcome::Draw));
    assert_eq!(sim.state().side(Side::One).stats.sheep_eaten, 1);
    assert_eq!(sim.state().side(Side::Two).stats.sheep_eaten, 1);
    assert_eq!(sim.state().board.tile_at(SHEEP1), TileKind::Wolf(Side::Two));
}

#[test]
fn turn_limit_decides_by_score() {
    let mut board = board();
    board.set_tile(Position::new(SHEEP2.row, SHEEP2.col - 1), TileKind::Rhubarb);
    let rules = RulesBuilder::new().with_max_turns(3).build().unwrap();

    let team2 = TeamAgents::new(Script::new([Move::Left]), idle());
    let report = simulator(game(board), idle_team(), team2)
        .with_rules(rules)
        .run()
        .unwrap();
    assert_eq!(report.turns, 3);
    assert_eq!(report.outcome, Outcome::Winner(Side::Two));
    assert_eq!((report.score1, report.score2), (0, 5));
    assert_eq!(report.to_string(), "two won 5 - 0.");
    // sheep twice and wolf once per turn
    assert_eq!(report.stats2.turns, 9);
    assert_eq!(report.stats1.turns, 9);
}

#[test]
fn score_matches_food_eaten() {
    let board = Board::load("maps/default.map").unwrap();
    let rules = RulesBuilder::new().with_max_turns(40).build().unwrap();
    let registry = AgentRegistry::with_builtin_teams();
    let state = Match::new("random", "random", board).unwrap();

    let report = Simulator::from_registry(&registry, state)
        .unwrap()
        .with_rules(rules)
        .run()
        .unwrap();
    for side in Side::BOTH {
        let stats = report.stats(side);
        assert_eq!(report.score(side), 5 * stats.rhubarb_eaten + stats.grass_eaten);
        assert_eq!((stats.grass_total, stats.rhubarb_total), (42, 9));
    }
    assert!(report.turns <= 40);
}

#[test]
fn spectator_sees_the_whole_match() {
    let spectator = SharedSpectator::default();
    let rules = RulesBuilder::new().with_max_turns(1).build().unwrap();
    let board = board();
    let report = simulator(game(board.clone()), idle_team(), idle_team())
        .with_rules(rules)
        .with_spectator(spectator.clone())
        .run()
        .unwrap();
    assert_eq!(report.outcome, Outcome::Draw);

    let packets = spectator.packets();
    assert_eq!(packets.len(), 1 + 15 + 6 + 1 + 1);
    assert_eq!(
        packets[0],
        Packet::NewGame {
            team1: "one".into(),
            team2: "two".into()
        }
    );
    for (packet, row) in packets[1..16].iter().zip(board.rows()) {
        assert_eq!(packet, &Packet::MapRow(*row));
    }
    let order: Vec<_> = moves(&packets).into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, TURN_ORDER);
    assert_eq!(packets[22], Packet::EndTurn);
    assert_eq!(packets[23], Packet::EndGame(Outcome::Draw));
}

#[test]
fn broken_spectator_is_dropped() {
    let mut sim = simulator(game(board()), idle_team(), idle_team())
        .with_spectator(BrokenSpectator { budget: 3 });
    assert!(sim.has_spectator());
    assert!(sim.play_turn().unwrap().is_running());
    assert!(!sim.has_spectator());
    assert!(sim.play_turn().unwrap().is_running());
}

#[test]
fn report_writes_stat_records() {
    let rules = RulesBuilder::new().with_max_turns(2).build().unwrap();
    let report = simulator(game(board()), idle_team(), idle_team())
        .with_rules(rules)
        .run()
        .unwrap();

    let mut out = Vec::new();
    report.write_stats(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let records: Vec<_> = text
        .lines()
        .map(|line| Statistics::from_record(line).unwrap())
        .collect();
    assert_eq!(records, [report.stats1.clone(), report.stats2.clone()]);
    assert_eq!(records[0].team(), "one");
    assert_eq!(records[1].draws, 1);
}

#[test]
fn referee_plays_registered_teams() {
    let referee = Referee::new(
        AgentRegistry::with_builtin_teams(),
        quiet(),
        RulesBuilder::new().with_max_turns(5).build().unwrap(),
    );
    let report = referee.play("idle", "idle", board(), None).unwrap();
    assert_eq!(report.outcome, Outcome::Draw);
    assert_eq!(report.turns, 5);

    assert!(referee.play("idle", "nobody", board(), None).is_err());
}

#[test]
fn referee_streams_to_spectator() {
    let spectator = SharedSpectator::default();
    let referee = Referee::new(
        AgentRegistry::with_builtin_teams(),
        quiet(),
        RulesBuilder::new().with_max_turns(1).build().unwrap(),
    );
    referee
        .play("random", "idle", board(), Some(Box::new(spectator.clone())))
        .unwrap();
    assert_eq!(
        spectator.packets().first(),
        Some(&Packet::NewGame {
            team1: "random".into(),
            team2: "idle".into()
        })
    );
}

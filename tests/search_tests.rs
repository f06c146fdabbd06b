//! Engine scenarios: decisions, proofs, pruning and the opening book.

use std::time::Duration;

use wallrave::board::{flag, parse_wall};
use wallrave::book::OpeningBook;
use wallrave::constants::{NUM_WALLS, OPENING_TURNS, SAMPLES};
use wallrave::mcts::{Engine, SearchConfig};
use wallrave::position::Position;
use wallrave::solver::winning_action;
use wallrave::symmetry::transform_wall;

fn config(max_iterations: usize) -> SearchConfig {
    SearchConfig {
        seed: Some(2024),
        transformation: Some(0),
        max_iterations,
        max_nodes: 20_000,
        ..SearchConfig::default()
    }
}

/// A position past the opening with at most five legal moves, for which
/// `wins` tells whether the player to move should have a forced win.
fn endgame(wins: bool) -> Position {
    for seed in 0.. {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut pos = Position::new();
        while pos.legal_move_count() > 5 {
            let mv = pos.random_move(&mut rng).unwrap();
            pos.apply_move(&mv);
        }
        if pos.turns >= OPENING_TURNS && !pos.is_end_game() && winning_action(&pos).is_some() == wins
        {
            return pos;
        }
    }
    unreachable!()
}

#[test]
fn test_single_iteration_decision() {
    let mut engine = Engine::new(config(1));
    let pos = Position::new();
    let (claim, mv) = engine.choose_move(&pos, false);

    assert!(!claim);
    assert_eq!(engine.table_len(), 2);
    let root = engine.state_info(pos.state).unwrap();
    let action = &root.actions[mv.wall];
    assert!(action.is_valid());
    assert_eq!(action.direct.visits, SAMPLES as u32);
    let visited = root.valid_actions().filter(|&a| root.actions[a].direct.visits > 0);
    assert_eq!(visited.count(), 1);
}

#[test]
fn test_finds_and_claims_forced_win() {
    let pos = endgame(true);
    let mut engine = Engine::new(config(5_000));
    let (claim, mv) = engine.choose_move(&pos, false);

    assert!(claim);
    assert!(engine.state_info(pos.state).unwrap().is_winning());
    let mut next = pos.clone();
    next.play(mv.wall).unwrap();
    assert_eq!(winning_action(&next), None);

    // The claim is only granted once per game.
    let (claim, again) = engine.choose_move(&pos, false);
    assert!(!claim);
    assert_eq!(again, mv);
}

#[test]
fn test_lost_position_still_moves() {
    let pos = endgame(false);
    let mut engine = Engine::new(config(5_000));
    let (claim, mv) = engine.choose_move(&pos, false);

    assert!(!claim);
    assert!(pos.legal_moves().any(|m| m == mv));
    assert!(engine.state_info(pos.state).unwrap().is_losing());
}

#[test]
fn test_clean_keeps_reached_subtree() {
    let mut engine = Engine::new(config(300));
    let mut pos = Position::new();
    let (_, mv) = engine.choose_move(&pos, false);
    let child_state = pos.state_after_move(&mv);
    assert!(engine.state_info(child_state).is_some());

    pos.apply_move(&mv);
    engine.clean(&pos);
    assert!(engine.state_info(0).is_none());
    assert!(engine.state_info(child_state).is_some());
}

#[test]
fn test_evaluate_needs_search() {
    let mut engine = Engine::new(config(50));
    let pos = Position::new();
    let mv = pos.get_move(parse_wall("C3h").unwrap());
    assert_eq!(engine.evaluate(&pos, &mv), None);
    engine.choose_move(&pos, false);
    assert!(engine.evaluate(&pos, &mv).is_some());

    // Pruned once the game has moved past the position.
    let mut next = pos.clone();
    next.apply_move(&mv);
    engine.clean(&next);
    assert_eq!(engine.evaluate(&pos, &mv), None);
}

#[test]
fn test_book_hit_skips_search() {
    let c3h = parse_wall("C3h").unwrap();
    for t in [0, 2, 5] {
        let book = OpeningBook::from_entries([(0, c3h)]);
        let mut engine = Engine::with_book(
            SearchConfig {
                transformation: Some(t),
                ..config(100)
            },
            book,
        );
        let (claim, mv) = engine.choose_move(&Position::new(), false);
        assert!(!claim);
        assert_eq!(mv.wall, transform_wall(c3h, t));
        assert_eq!(engine.table_len(), 0);
    }
}

#[test]
fn test_illegal_book_move_falls_back_to_search() {
    let c3h = parse_wall("C3h").unwrap();
    let book = OpeningBook::from_entries([(flag(c3h), c3h)]);
    let mut engine = Engine::with_book(config(50), book);
    let pos = Position::from_walls(&[c3h]).unwrap();
    let (_, mv) = engine.choose_move(&pos, false);
    assert_ne!(mv.wall, c3h);
    assert!(engine.table_len() > 0);
}

#[test]
fn test_time_limit_stops_search() {
    let mut engine = Engine::new(SearchConfig {
        default_move_time: Duration::from_millis(50),
        check_time: Duration::from_millis(20),
        max_iterations: usize::MAX,
        ..config(0)
    });
    let before = engine.time_spent();
    let pos = Position::new();
    engine.choose_move(&pos, true);
    let spent = engine.time_spent() - before;
    assert!(spent >= Duration::from_millis(50));
    assert!(spent < Duration::from_secs(5));
}

#[test]
fn test_node_cap_degrades() {
    for cap in [1, 2, 5] {
        let mut engine = Engine::new(SearchConfig {
            max_nodes: cap,
            samples: 2,
            ..config(100)
        });
        let mut pos = Position::new();
        while !pos.is_end_game() {
            let (_, mv) = engine.choose_move(&pos, false);
            // Only the root may be created past the cap.
            assert!(engine.table_len() <= cap + 1, "cap {cap}: {} nodes", engine.table_len());
            pos.play(mv.wall).unwrap();
        }
        assert!(pos.turns <= NUM_WALLS);
        assert!(pos.winner().is_some());
    }
}


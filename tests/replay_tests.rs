// Integration tests for the replay engine
//
// Loads recorded JSONL decisions and re-runs the engine on them:
// - Turn 0: dead-end corridor versus open area
// - Turn 1: a single legal move
// - Turn 2: the same position with a deliberately wrong logged move

use lightcycle_agent::config::Config;
use lightcycle_agent::replay::ReplayEngine;
use lightcycle_agent::types::Direction;
use std::path::PathBuf;

/// Helper function to get the path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

fn engine() -> ReplayEngine {
    ReplayEngine::new(Config::default_hardcoded(), false)
}

#[test]
fn test_load_fixture() {
    let entries = engine()
        .load_log_file(fixture_path("forced_moves.jsonl"))
        .expect("Failed to load forced_moves.jsonl");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].turn, 0);
    assert_eq!(entries[0].chosen_move, Direction::Right);
    assert_eq!(entries[2].chosen_move, Direction::Left);
    // Both row encodings describe the same board
    assert_eq!(entries[1].state.board, entries[2].state.board);
}

#[test]
fn test_replay_reproduces_logged_decisions() {
    let engine = engine();
    let entries = engine.load_log_file(fixture_path("forced_moves.jsonl")).unwrap();

    let results = engine.replay_turns(&entries, &[0, 1]).unwrap();
    assert!(results.iter().all(|r| r.matches), "{:?}", results);
    assert!(results.iter().all(|r| r.fallback.is_none()));
}

#[test]
fn test_replay_stats_count_mismatches() {
    let engine = engine();
    let entries = engine.load_log_file(fixture_path("forced_moves.jsonl")).unwrap();

    let results = engine.replay_all(&entries);
    let stats = engine.generate_stats(&results);

    assert_eq!(stats.total_turns, 3);
    assert_eq!(stats.matches, 2);
    assert_eq!(stats.mismatches, 1);
    assert_eq!(results[2].original_move, Direction::Left);
    assert_eq!(results[2].replayed_move, Direction::Right);
}

#[test]
fn test_validate_expected_moves() {
    let engine = engine();
    let entries = engine.load_log_file(fixture_path("forced_moves.jsonl")).unwrap();

    engine
        .validate_expected_moves(
            &entries,
            &[(0, vec![Direction::Right]), (2, vec![Direction::Left, Direction::Up])],
        )
        .expect("logged moves should validate");

    let err = engine
        .validate_expected_moves(&entries, &[(1, vec![Direction::Down])])
        .unwrap_err();
    assert!(err.contains("Turn 1"), "{}", err);
}

#[test]
fn test_missing_log_file_is_an_error() {
    assert!(engine()
        .load_log_file(fixture_path("does_not_exist.jsonl"))
        .is_err());
}

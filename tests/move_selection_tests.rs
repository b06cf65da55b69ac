// Integration tests for the async decision entry point
//
// Covers the situations the agent process meets on stdin: forced moves,
// fully trapped heads, tight deadlines and snapshots that fail to parse.

use lightcycle_agent::bot::Bot;
use lightcycle_agent::config::Config;
use lightcycle_agent::debug_logger::DebugLogger;
use lightcycle_agent::error::EngineError;
use lightcycle_agent::types::{Direction, GameState};

fn parse(json: &str) -> GameState {
    GameState::from_json(json).expect("fixture snapshot should parse")
}

#[tokio::test]
async fn test_single_legal_move_is_taken() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = parse(
        r#"{"board": ["XXXXX", "X..XX", "XXXXX", "....."],
            "you": [1, 1], "opponent": [3, 4], "opponent_last_direction": "LEFT"}"#,
    );

    assert_eq!(bot.get_move(&state).await, Direction::Right);
    assert_eq!(bot.choose_move(&state), Direction::Right);
}

/// Head on the top edge, walled in on the remaining three sides:
/// the fallback must not pick UP, which would leave the board
#[tokio::test]
async fn test_trapped_at_top_edge_stays_in_bounds() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = parse(
        r#"{"board": ["X.X..", ".X...", "....."],
            "you": [0, 1], "opponent": [2, 4], "turn": 40}"#,
    );

    for _ in 0..20 {
        let direction = bot.get_move(&state).await;
        assert_ne!(direction, Direction::Up, "trapped fallback left the board");
    }
}

#[tokio::test]
async fn test_trapped_in_corner_picks_an_in_bounds_direction() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = parse(
        r#"{"board": [[" ", "X", " "], ["X", " ", " "], [" ", " ", " "]],
            "you": [0, 0], "opponent": [2, 2]}"#,
    );

    for _ in 0..20 {
        let direction = bot.choose_move(&state);
        assert!(
            matches!(direction, Direction::Down | Direction::Right),
            "got {}",
            direction
        );
    }
}

#[tokio::test]
async fn test_tight_deadline_still_answers_a_legal_move() {
    let bot = Bot::new(Config::default_hardcoded());
    let rows: Vec<String> = (0..18).map(|_| format!("\"{}\"", ".".repeat(20))).collect();
    let json = format!(
        r#"{{"board": [{}], "you": [9, 9], "opponent": [2, 2],
             "opponent_last_direction": "RIGHT", "turn": 12, "deadline_ms": 1}}"#,
        rows.join(",")
    );
    let state = parse(&json);

    let direction = bot.get_move(&state).await;
    assert!(state.board.legal_moves(&state.you).contains(&direction));
}

/// The first direction in priority order is walled off and the budget is
/// already spent: the answer must still be one of the legal moves
#[tokio::test]
async fn test_zero_deadline_never_answers_a_blocked_move() {
    let mut sequential = Config::default_hardcoded();
    sequential.strategy.parallel = false;
    let mut parallel = Config::default_hardcoded();
    parallel.strategy.min_cpus_for_parallel = 1;

    let state = parse(
        r#"{"board": ["XXX", "...", "..."], "you": [1, 1], "opponent": [2, 2],
            "deadline_ms": 0}"#,
    );
    let legal = state.board.legal_moves(&state.you);
    assert!(!legal.contains(&Direction::Up));

    for config in [sequential, parallel] {
        let bot = Bot::new(config);
        for _ in 0..50 {
            let direction = bot.get_move(&state).await;
            assert!(legal.contains(&direction), "answered {}", direction);
        }
    }
}

fn pocket_board_json(deadline_ms: Option<u64>) -> String {
    // 20x20 open board; the cell above the head is a one-cell dead end
    let rows: Vec<String> = (0..20)
        .map(|row| {
            let line: String = (0..20)
                .map(|col| match (row, col) {
                    (8, 10) | (9, 9) | (9, 11) => 'X',
                    _ => '.',
                })
                .collect();
            format!("\"{}\"", line)
        })
        .collect();
    let deadline = deadline_ms
        .map(|ms| format!(r#", "deadline_ms": {}"#, ms))
        .unwrap_or_default();
    format!(
        r#"{{"board": [{}], "you": [10, 10], "opponent": [2, 3],
             "opponent_last_direction": "DOWN"{}}}"#,
        rows.join(","),
        deadline
    )
}

#[tokio::test]
async fn test_generous_deadline_matches_untimed_choice() {
    let bot = Bot::new(Config::default_hardcoded());
    let untimed = parse(&pocket_board_json(None));
    let timed = parse(&pocket_board_json(Some(5_000)));

    let expected = bot.choose_move(&untimed);
    assert_ne!(expected, Direction::Up, "the dead end should never win");
    assert_eq!(bot.get_move(&timed).await, expected);
}

/// Answers given after the budget ran out are logged like any other
#[tokio::test]
async fn test_every_answer_reaches_the_debug_log() {
    let path = std::env::temp_dir().join(format!("move-log-{}.jsonl", std::process::id()));
    let logger = DebugLogger::new(true, &path.to_string_lossy()).await;
    let bot = Bot::with_logger(Config::default_hardcoded(), logger.clone());

    let rows: Vec<String> = (0..60).map(|_| format!("\"{}\"", ".".repeat(60))).collect();
    let json = format!(
        r#"{{"board": [{}], "you": [30, 30], "opponent": [5, 5],
             "turn": 77, "deadline_ms": 0}}"#,
        rows.join(",")
    );
    let state = parse(&json);

    let direction = bot.get_move(&state).await;
    logger.flush().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(entry["turn"], 77);
    assert_eq!(entry["chosen_move"], direction.as_str());

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_avoids_predicted_opponent_cell() {
    let bot = Bot::new(Config::default_hardcoded());
    // Opponent at (2,2) heading UP lands on (1,2); DOWN is the mirror image
    let state = parse(
        r#"{"board": ["XXXX", "X..X", "X..X", "XXXX"],
            "you": [1, 1], "opponent": [2, 2], "opponent_last_direction": "UP"}"#,
    );

    assert_eq!(bot.get_move(&state).await, Direction::Down);
}

#[test]
fn test_malformed_snapshots_are_rejected() {
    assert!(matches!(
        GameState::from_json("{\"board\": [\"...\"]"),
        Err(EngineError::Json(_))
    ));
    assert!(matches!(
        GameState::from_json(r#"{"board": ["..", "..."], "you": [0, 0], "opponent": [1, 1]}"#),
        Err(EngineError::RaggedBoard { .. })
    ));
    assert!(matches!(
        GameState::from_json(r#"{"board": ["..", ".."], "you": [0, 0], "opponent": [4, 1]}"#),
        Err(EngineError::PositionOutOfBounds { .. })
    ));
}

#[test]
fn test_sequential_and_parallel_agree() {
    let mut sequential = Config::default_hardcoded();
    sequential.strategy.parallel = false;
    let parallel = Config::default_hardcoded();

    let state = parse(
        r#"{"board": ["......", ".X....", "....X.", "......", "..X..."],
            "you": [2, 2], "opponent": [4, 5], "opponent_last_direction": "UP"}"#,
    );

    assert_eq!(
        Bot::new(sequential).choose_move(&state),
        Bot::new(parallel).choose_move(&state)
    );
}

// Heuristic move scoring
//
// Scores one candidate direction for the evaluating agent. Every simulation
// runs on an owned copy of the snapshot board; the caller's board is never
// touched.

use log::debug;
use serde::Serialize;

use crate::board::Board;
use crate::config::{Config, WeightsConfig};
use crate::error::EngineError;
use crate::profile;
use crate::simple_profiler::Category;
use crate::space::{self, FloodFillCache, SearchLimits};
use crate::types::{Direction, GameState, Position};

/// Individual signals behind a non-fatal score, kept for logs and replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub destination: Position,
    pub own_path: usize,
    pub opponent_path: usize,
    pub path_diff: i64,
    pub threat_ratio: f64,
    pub headon: bool,
    pub risk: bool,
    pub exploration: bool,
    pub freedom: usize,
    pub endgame: bool,
    pub space: usize,
    pub total: f64,
}

/// Outcome of evaluating a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Leaves the board or runs into a wall or trail
    Fatal,
    Scored(ScoreBreakdown),
}

/// Per-decision resources shared by every candidate evaluation
pub struct EvalContext<'a> {
    pub limits: SearchLimits,
    pub cache: &'a FloodFillCache,
}

/// Fixed, hand-tuned scoring function
#[derive(Debug, Clone)]
pub struct Heuristic {
    weights: WeightsConfig,
    territory_max_depth: usize,
}

impl Heuristic {
    pub fn new(config: &Config) -> Self {
        Heuristic {
            weights: config.weights.clone(),
            territory_max_depth: config.search.territory_max_depth,
        }
    }

    /// The sentinel returned for fatal moves
    pub fn fatal_score(&self) -> f64 {
        self.weights.fatal
    }

    /// Scores `direction` for the evaluating agent without a deadline.
    /// Higher is better; fatal moves get `fatal_score()`.
    pub fn score(&self, state: &GameState, direction: Direction) -> Result<f64, EngineError> {
        let cache = FloodFillCache::new();
        let ctx = EvalContext {
            limits: SearchLimits::unbounded(),
            cache: &cache,
        };
        Ok(self.to_score(&self.evaluate(state, direction, &ctx)?))
    }

    pub fn to_score(&self, evaluation: &Evaluation) -> f64 {
        match evaluation {
            Evaluation::Fatal => self.weights.fatal,
            Evaluation::Scored(breakdown) => breakdown.total,
        }
    }

    /// Runs the full evaluation and returns every signal that went into it
    pub fn evaluate(
        &self,
        state: &GameState,
        direction: Direction,
        ctx: &EvalContext<'_>,
    ) -> Result<Evaluation, EngineError> {
        profile!(Category::Score, {
            Self::check_position(&state.board, "you", state.you)?;
            Self::check_position(&state.board, "opponent", state.opponent)?;

            // 1. Simulate the move on the snapshot
            let destination = direction.apply(&state.you);
            if !state.board.is_open(&destination) {
                return Ok(Evaluation::Fatal);
            }

            // 2. Both pre-move heads are now trail
            let board = state.board.with_walls(&[state.you, state.opponent]);
            if !board.is_open(&destination) {
                return Ok(Evaluation::Fatal);
            }

            // 3. Path advantage
            let own_path = space::longest_safe_path(&board, destination, &ctx.limits);
            let opponent_path = space::longest_safe_path(&board, state.opponent, &ctx.limits);
            let path_diff = own_path as i64 - opponent_path as i64;

            // 4. Contested territory
            let threat_ratio = space::territorial_threat(
                &board,
                destination,
                state.opponent,
                self.territory_max_depth,
                &ctx.limits,
            );

            // 5-6. Collision risk
            let headon = destination == state.opponent;
            let predicted = state.opponent_heading.apply(&state.opponent);
            let risk = destination == predicted;

            // 7. Unclaimed space, checked before the destination becomes our head
            let exploration = board.is_open(&destination);

            // 8-9. Freedom and terminal detection on the updated board
            let freedom = board.legal_moves(&destination).len();
            let endgame = board.is_full();

            let space = ctx.cache.flood_fill(&board, destination);

            let w = &self.weights;
            let mut total = w.survival;
            total += w.path_diff * path_diff as f64;
            total += w.headon * f64::from(u8::from(headon));
            total += w.risk * f64::from(u8::from(risk));
            total += w.territory_threat * threat_ratio;
            if exploration {
                total += w.exploration;
            }
            total += w.freedom * freedom as f64;
            total += w.space * space as f64;
            if endgame {
                total += w.endgame;
            }

            let breakdown = ScoreBreakdown {
                destination,
                own_path,
                opponent_path,
                path_diff,
                threat_ratio,
                headon,
                risk,
                exploration,
                freedom,
                endgame,
                space,
                total,
            };
            debug!("{} -> {:?}", direction.as_str(), breakdown);

            Ok(Evaluation::Scored(breakdown))
        })
    }

    fn check_position(board: &Board, who: &'static str, pos: Position) -> Result<(), EngineError> {
        if board.in_bounds(&pos) {
            Ok(())
        } else {
            Err(EngineError::PositionOutOfBounds {
                who,
                row: pos.row,
                col: pos.col,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> Heuristic {
        Heuristic::new(&Config::default_hardcoded())
    }

    fn state(lines: &[&str], you: (i32, i32), opp: (i32, i32), heading: Direction) -> GameState {
        GameState::new(
            Board::from_lines(lines).unwrap(),
            Position::new(you.0, you.1),
            Position::new(opp.0, opp.1),
            heading,
        )
    }

    #[test]
    fn test_off_board_and_wall_moves_are_fatal() {
        let h = heuristic();
        let s = state(&["..X", "...", "..."], (0, 1), (2, 2), Direction::Up);

        assert_eq!(h.score(&s, Direction::Up).unwrap(), h.fatal_score());
        assert_eq!(h.score(&s, Direction::Right).unwrap(), h.fatal_score());
        assert!(h.score(&s, Direction::Down).unwrap() > h.fatal_score());
        assert!(h.score(&s, Direction::Left).unwrap() > h.fatal_score());
    }

    #[test]
    fn test_moving_onto_opponent_head_is_fatal() {
        let h = heuristic();
        let s = state(&["...", "...", "..."], (1, 0), (1, 1), Direction::Left);
        assert_eq!(h.score(&s, Direction::Right).unwrap(), h.fatal_score());
    }

    #[test]
    fn test_fatal_sentinel_below_any_safe_score() {
        let h = heuristic();
        // Worst realistic case: boxed-in destination, huge opponent region
        let mut lines = vec![".".repeat(20); 18];
        lines[0] = format!(".X{}", ".".repeat(18));
        lines[1] = format!("XX{}", ".".repeat(18));
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let s = state(&refs, (1, 0), (9, 9), Direction::Up);

        let safe = h.score(&s, Direction::Up).unwrap();
        assert!(safe > h.fatal_score());
        assert!(safe < 0.0, "opponent path advantage should dominate: {}", safe);
    }

    #[test]
    fn test_moving_into_predicted_cell_is_penalized() {
        // 4x4 arena with a solid border; opponent at (2,2) heading UP will
        // step into (1,2). Moving RIGHT collides with that prediction, DOWN
        // is its mirror image without the risk.
        let h = heuristic();
        let s = state(&["XXXX", "X..X", "X..X", "XXXX"], (1, 1), (2, 2), Direction::Up);

        let toward = h.score(&s, Direction::Right).unwrap();
        let away = h.score(&s, Direction::Down).unwrap();

        assert!(toward < away);
        let risk = Config::default_hardcoded().weights.risk;
        assert!((toward - away - risk).abs() < 1e-9);
    }

    #[test]
    fn test_heading_into_border_carries_no_risk() {
        // Opponent heading DOWN predicts (3,2), a border wall: both moves equal
        let h = heuristic();
        let s = state(&["XXXX", "X..X", "X..X", "XXXX"], (1, 1), (2, 2), Direction::Down);

        let right = h.score(&s, Direction::Right).unwrap();
        let down = h.score(&s, Direction::Down).unwrap();
        assert!((right - down).abs() < 1e-9);
    }

    #[test]
    fn test_open_area_beats_dead_end_corridor() {
        let h = heuristic();
        let s = state(
            &[
                "XXXXX....",
                "XXXXX....",
                "X........",
                "XXXXX....",
                "XXXXX....",
            ],
            (2, 4),
            (0, 0),
            Direction::Down,
        );
        // Opponent is sealed in the top-left corner with no room
        let corridor = h.score(&s, Direction::Left).unwrap();
        let open = h.score(&s, Direction::Right).unwrap();
        assert!(open > corridor);
    }

    #[test]
    fn test_breakdown_signals() {
        let h = heuristic();
        let s = state(&[".....", ".....", "....."], (1, 1), (1, 3), Direction::Left);
        let cache = FloodFillCache::new();
        let ctx = EvalContext {
            limits: SearchLimits::unbounded(),
            cache: &cache,
        };

        let Evaluation::Scored(b) = h.evaluate(&s, Direction::Right, &ctx).unwrap() else {
            panic!("moving right should be safe");
        };
        assert_eq!(b.destination, Position::new(1, 2));
        assert!(b.risk, "opponent heading LEFT lands on (1,2)");
        assert!(!b.headon);
        assert!(b.exploration);
        assert!(!b.endgame);
        assert_eq!(b.freedom, 2);
        assert_eq!(b.space, 13);
        assert!((0.0..=1.0).contains(&b.threat_ratio));
        assert_eq!(b.path_diff, b.own_path as i64 - b.opponent_path as i64);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_score_is_idempotent_and_leaves_board_alone() {
        let h = heuristic();
        let s = state(&["......", ".X....", "....X.", "......"], (0, 0), (3, 5), Direction::Left);
        let before = s.clone();

        for dir in Direction::all() {
            let first = h.score(&s, dir).unwrap();
            let second = h.score(&s, dir).unwrap();
            assert_eq!(first, second);
        }
        assert_eq!(s, before);
    }

    #[test]
    fn test_out_of_bounds_state_is_an_error() {
        let h = heuristic();
        let s = state(&["...", "..."], (0, 0), (5, 5), Direction::Up);
        assert!(matches!(
            h.score(&s, Direction::Right),
            Err(EngineError::PositionOutOfBounds { who: "opponent", .. })
        ));
    }
}

// Error types for snapshot parsing and move evaluation

use thiserror::Error;

/// Errors raised by the decision engine
///
/// Parsing errors fail fast: the engine never guesses a value for a
/// missing or malformed field. Evaluation errors are contained per
/// candidate by the move selector.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board has no cells")]
    EmptyBoard,

    #[error("board row {row} has {found} cells, expected {expected}")]
    RaggedBoard {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell marker {marker:?} at ({row}, {col})")]
    InvalidCell {
        row: usize,
        col: usize,
        marker: String,
    },

    #[error("{who} position ({row}, {col}) is outside the board")]
    PositionOutOfBounds {
        who: &'static str,
        row: i32,
        col: i32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

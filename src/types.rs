// Light-cycle arena types
// Wire format: one JSON object per line, positions as [row, col]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::board::Board;
use crate::error::EngineError;

/// 2D coordinate on the board, (row, col) with row 0 at the top
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }
}

impl From<[i32; 2]> for Position {
    fn from([row, col]: [i32; 2]) -> Self {
        Position { row, col }
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> Self {
        [pos.row, pos.col]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Represents the four possible movement directions of a light-cycle
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all directions in tie-break priority order
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Converts direction to the wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }

    /// (row-delta, col-delta)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Calculates the next position when moving in this direction
    pub fn apply(&self, pos: &Position) -> Position {
        let (dr, dc) = self.delta();
        Position {
            row: pos.row + dr,
            col: pos.col + dc,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Index into `Direction::all()`, used for lock-free encoding
    pub fn index(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_index(idx: u8) -> Option<Direction> {
        Direction::all().get(idx as usize).copied()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// A board row on the wire: either a list of single-character markers
/// or one string with a character per cell
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum WireRow {
    Cells(Vec<String>),
    Line(String),
}

impl WireRow {
    pub fn markers(&self) -> Vec<String> {
        match self {
            WireRow::Cells(cells) => cells.clone(),
            WireRow::Line(line) => line.chars().map(String::from).collect(),
        }
    }
}

/// Raw input snapshot as received from the harness
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Snapshot {
    pub board: Vec<WireRow>,
    pub you: Position,
    pub opponent: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_last_direction: Option<Direction>,
    #[serde(default)]
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

/// Validated game state handed to the engine
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(try_from = "Snapshot", into = "Snapshot")]
pub struct GameState {
    pub board: Board,
    pub you: Position,
    pub opponent: Position,
    pub opponent_heading: Direction,
    pub turn: u32,
    pub deadline_ms: Option<u64>,
}

impl GameState {
    /// Parses and validates one JSON line
    pub fn from_json(line: &str) -> Result<Self, EngineError> {
        let snapshot: Snapshot = serde_json::from_str(line)?;
        GameState::try_from(snapshot)
    }

    pub fn new(board: Board, you: Position, opponent: Position, opponent_heading: Direction) -> Self {
        GameState {
            board,
            you,
            opponent,
            opponent_heading,
            turn: 0,
            deadline_ms: None,
        }
    }
}

impl TryFrom<Snapshot> for GameState {
    type Error = EngineError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        let rows: Vec<Vec<String>> = snapshot.board.iter().map(WireRow::markers).collect();
        let board = Board::from_rows(&rows)?;

        for (who, pos) in [("you", snapshot.you), ("opponent", snapshot.opponent)] {
            if !board.in_bounds(&pos) {
                return Err(EngineError::PositionOutOfBounds {
                    who,
                    row: pos.row,
                    col: pos.col,
                });
            }
        }

        Ok(GameState {
            board,
            you: snapshot.you,
            opponent: snapshot.opponent,
            // The harness omits the heading before the opponent has moved
            opponent_heading: snapshot.opponent_last_direction.unwrap_or(Direction::Up),
            turn: snapshot.turn,
            deadline_ms: snapshot.deadline_ms,
        })
    }
}

impl From<GameState> for Snapshot {
    fn from(state: GameState) -> Self {
        Snapshot {
            board: state.board.to_lines().into_iter().map(WireRow::Line).collect(),
            you: state.you,
            opponent: state.opponent,
            opponent_last_direction: Some(state.opponent_heading),
            turn: state.turn,
            deadline_ms: state.deadline_ms,
        }
    }
}

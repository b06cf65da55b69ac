// Arena grid and movement utilities
//
// The board is an immutable snapshot for the duration of a decision. Any
// hypothetical move is simulated on an owned copy (see `with_walls`).

use std::fmt;

use crate::error::EngineError;
use crate::types::{Direction, Position};

/// State of a single arena cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Open,
    Wall,
}

impl Cell {
    /// Parses a wire marker. Open cells arrive as " " or ".", trail and
    /// wall cells as "X", "#" or "A".
    pub fn from_marker(marker: &str) -> Option<Cell> {
        match marker {
            " " | "." => Some(Cell::Open),
            "X" | "#" | "A" => Some(Cell::Wall),
            _ => None,
        }
    }

    pub fn marker(&self) -> char {
        match self {
            Cell::Open => '.',
            Cell::Wall => 'X',
        }
    }
}

/// Fixed-size rectangular grid stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a fully open board
    pub fn new(height: usize, width: usize) -> Self {
        Board {
            height,
            width,
            cells: vec![Cell::Open; height * width],
        }
    }

    /// Builds a board from rows of single-character markers
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self, EngineError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(EngineError::EmptyBoard);
        }

        let mut cells = Vec::with_capacity(rows.len() * width);
        for (row, markers) in rows.iter().enumerate() {
            if markers.len() != width {
                return Err(EngineError::RaggedBoard {
                    row,
                    expected: width,
                    found: markers.len(),
                });
            }
            for (col, marker) in markers.iter().enumerate() {
                let cell = Cell::from_marker(marker).ok_or_else(|| EngineError::InvalidCell {
                    row,
                    col,
                    marker: marker.clone(),
                })?;
                cells.push(cell);
            }
        }

        Ok(Board {
            height: rows.len(),
            width,
            cells,
        })
    }

    /// Builds a board from one string per row, e.g. `["X..", "..X"]`
    pub fn from_lines(lines: &[&str]) -> Result<Self, EngineError> {
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| line.chars().map(String::from).collect())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(Cell::marker).collect())
            .collect()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// True iff row is in [0, height) and col is in [0, width)
    pub fn in_bounds(&self, pos: &Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.height
            && (pos.col as usize) < self.width
    }

    /// Dense row-major index, or None when off the board
    pub(crate) fn index(&self, pos: &Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row as usize * self.width + pos.col as usize)
        } else {
            None
        }
    }

    /// Cell state, or None when off the board
    pub fn cell(&self, pos: &Position) -> Option<Cell> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    pub fn is_open(&self, pos: &Position) -> bool {
        self.cell(pos) == Some(Cell::Open)
    }

    /// Marks a cell as wall. Off-board positions are ignored.
    pub fn set_wall(&mut self, pos: &Position) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx] = Cell::Wall;
        }
    }

    /// Returns an owned copy with the given cells walled off
    pub fn with_walls(&self, walls: &[Position]) -> Board {
        let mut board = self.clone();
        for pos in walls {
            board.set_wall(pos);
        }
        board
    }

    /// Directions whose destination is in-bounds and open, in tie-break order
    pub fn legal_moves(&self, pos: &Position) -> Vec<Direction> {
        Direction::all()
            .iter()
            .filter(|dir| self.is_open(&dir.apply(pos)))
            .copied()
            .collect()
    }

    /// In-bounds 4-connected neighbours
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::all()
            .into_iter()
            .map(move |dir| dir.apply(&pos))
            .filter(move |next| self.in_bounds(next))
    }

    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Open).count()
    }

    /// True once no open cell remains anywhere
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c == Cell::Wall)
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

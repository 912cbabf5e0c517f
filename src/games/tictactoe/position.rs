//! Board coordinates for tic-tac-toe moves.

use super::action::Rejection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A validated (row, col) coordinate on the 3x3 board.
///
/// Both components are always in `0..3`; the only way to build one from
/// untrusted input is [`Position::new`], which rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Board side length.
    pub const SIZE: usize = 3;

    /// Top-left corner.
    pub const TOP_LEFT: Position = Position::at(0, 0);
    /// Center square.
    pub const CENTER: Position = Position::at(1, 1);
    /// Bottom-right corner.
    pub const BOTTOM_RIGHT: Position = Position::at(2, 2);

    /// All 9 positions in row-major order.
    pub const ALL: [Position; 9] = [
        Position::at(0, 0),
        Position::at(0, 1),
        Position::at(0, 2),
        Position::at(1, 0),
        Position::at(1, 1),
        Position::at(1, 2),
        Position::at(2, 0),
        Position::at(2, 1),
        Position::at(2, 2),
    ];

    const fn at(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Validates a coordinate pair.
    #[instrument]
    pub fn new(row: usize, col: usize) -> Result<Self, Rejection> {
        if row >= Self::SIZE || col >= Self::SIZE {
            return Err(Rejection::InvalidCoordinate { row, col });
        }
        Ok(Self::at(row, col))
    }

    /// Row index (0 = top).
    pub fn row(self) -> usize {
        self.row
    }

    /// Column index (0 = left).
    pub fn col(self) -> usize {
        self.col
    }

    /// Row-major index (0-8).
    pub fn to_index(self) -> usize {
        self.row * Self::SIZE + self.col
    }

    /// Creates a position from a row-major index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parses "row col", "row,col" or a single row-major index.
    #[instrument]
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<usize> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;

        match parts.as_slice() {
            [index] => Self::from_index(*index),
            [row, col] => Self::new(*row, *col).ok(),
            _ => None,
        }
    }
}

impl TryFrom<(usize, usize)> for Position {
    type Error = Rejection;

    fn try_from((row, col): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(row, col)
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

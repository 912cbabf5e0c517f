//! Core domain types for tic-tac-toe.

use super::action::Rejection;
use super::position::Position;
use serde::{Deserialize, Serialize};

/// Player seat in the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// Player A (first connector, moves first).
    #[display("A")]
    A,
    /// Player B (second connector).
    #[display("B")]
    B,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Board glyph for this player's marks.
    pub fn mark(self) -> char {
        match self {
            Player::A => 'X',
            Player::B => 'O',
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square occupied by a player.
    Occupied(Player),
}

/// 3x3 tic-tac-toe board, indexed by (row, col).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Square; 3]; 3],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [[Square::Empty; 3]; 3],
        }
    }

    /// Gets the square at the given position. Untouched squares are `Empty`.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.row()][pos.col()]
    }

    /// Places a mark on an empty square.
    ///
    /// Fails with [`Rejection::CellOccupied`] and leaves the board untouched
    /// if the square already holds a mark. Only the session (and the client
    /// mirror applying replicated state) may call this.
    pub(crate) fn set(&mut self, pos: Position, player: Player) -> Result<(), Rejection> {
        let square = &mut self.squares[pos.row()][pos.col()];
        if *square != Square::Empty {
            return Err(Rejection::CellOccupied(pos));
        }
        *square = Square::Occupied(player);
        Ok(())
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Iterates over every square in row-major order.
    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.squares.iter().flatten().copied()
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares().filter(|s| *s != Square::Empty).count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, squares) in self.squares.iter().enumerate() {
            for (col, square) in squares.iter().enumerate() {
                let symbol = match square {
                    Square::Empty => '.',
                    Square::Occupied(player) => player.mark(),
                };
                result.push(symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of evaluating a board.
///
/// Always derived from the board by [`super::rules::evaluate`]; never stored
/// with authority of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// No line complete and at least one empty square.
    Undecided,
    /// The player completed a line.
    Won(Player),
    /// Every square is occupied and no line is complete.
    Draw,
}

impl Outcome {
    /// Returns true once the game can no longer continue.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::Undecided)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Undecided => write!(f, "Undecided"),
            Outcome::Won(player) => write!(f, "Player {} wins", player),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

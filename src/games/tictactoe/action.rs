//! First-class action types for tic-tac-toe.
//!
//! Moves are domain events, not side effects. They represent
//! the player's intent and can be validated independently of execution.

use super::{Player, Position};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A move in tic-tac-toe: a player placing their mark at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The player making the move.
    pub player: Player,
    /// The position where the player places their mark.
    pub position: Position,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(player: Player, position: Position) -> Self {
        Self { player, position }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.player, self.position)
    }
}

/// Reason a proposal was refused.
///
/// Every rejection is recoverable and silent at the protocol level: the
/// session state is untouched and no notification goes out. The value only
/// exists so the local caller can log or count it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Rejection {
    /// Row or column outside `0..3`.
    #[display("Coordinate ({}, {}) is off the board", row, col)]
    InvalidCoordinate {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The square at the position is already occupied.
    #[display("Square {} is already occupied", _0)]
    CellOccupied(Position),

    /// The requester is not the player whose turn it is.
    #[display("It's not {}'s turn", _0)]
    NotYourTurn(Player),

    /// The session is waiting for players or already finished.
    #[display("Session is not accepting moves")]
    SessionNotActive,

    /// A connection claimed a seat other than the one it was assigned.
    #[display("Connection bound to {} claimed seat {}", seat, claimed)]
    ImpersonatedSeat {
        /// Seat the connection was assigned.
        seat: Player,
        /// Seat named in the proposal.
        claimed: Player,
    },
}

impl std::error::Error for Rejection {}

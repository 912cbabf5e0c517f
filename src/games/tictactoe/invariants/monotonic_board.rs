//! Monotonic board invariant: squares never change once set.

use super::super::Board;
use super::Invariant;
use crate::session::GameSession;

/// Invariant: Board squares are monotonic (never overwritten).
///
/// Replaying the history onto an empty board must never hit an occupied
/// square and must reproduce the live board exactly.
pub struct MonotonicBoardInvariant;

impl Invariant<GameSession> for MonotonicBoardInvariant {
    fn holds(session: &GameSession) -> bool {
        let mut reconstructed = Board::new();

        for mov in session.history() {
            if reconstructed.set(mov.position, mov.player).is_err() {
                return false;
            }
        }

        reconstructed == *session.board()
    }

    fn description() -> &'static str {
        "Board squares are monotonic (never overwritten)"
    }
}

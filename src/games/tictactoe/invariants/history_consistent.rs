//! History consistency invariant: history length matches occupied squares.

use super::Invariant;
use crate::session::GameSession;

/// Invariant: History length equals number of occupied squares.
pub struct HistoryConsistentInvariant;

impl Invariant<GameSession> for HistoryConsistentInvariant {
    fn holds(session: &GameSession) -> bool {
        session.history().len() == session.board().occupied()
    }

    fn description() -> &'static str {
        "History length matches number of occupied squares"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::session_after;
    use super::*;
    use crate::games::tictactoe::{Player, Position};

    #[test]
    fn test_played_game_holds() {
        assert!(HistoryConsistentInvariant::holds(&session_after(&[
            (0, 0),
            (2, 2)
        ])));
    }

    #[test]
    fn test_extra_mark_violates() {
        let mut session = session_after(&[(0, 0)]);
        session
            .board
            .set(Position::CENTER, Player::B)
            .expect("empty square");
        assert!(!HistoryConsistentInvariant::holds(&session));
    }
}

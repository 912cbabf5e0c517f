//! Alternating turn invariant: players alternate A, B, A, B, ...

use super::super::Player;
use super::Invariant;
use crate::session::{GameSession, SessionPhase};

/// Invariant: Players alternate turns.
///
/// Move history must show A, B, A, B, ... and the turn authority must name
/// the next player, except after the final move where it stays put.
pub struct AlternatingTurnInvariant;

impl Invariant<GameSession> for AlternatingTurnInvariant {
    fn holds(session: &GameSession) -> bool {
        let history = session.history();

        if let Some(first) = history.first()
            && first.player != Player::A
        {
            return false;
        }

        if history.windows(2).any(|w| w[0].player == w[1].player) {
            return false;
        }

        let expected = match (session.phase(), history.last()) {
            (SessionPhase::Finished, Some(last)) => last.player,
            (_, Some(last)) => last.player.opponent(),
            (_, None) => Player::A,
        };
        session.current_turn() == expected
    }

    fn description() -> &'static str {
        "Players alternate turns (A, B, A, B, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::session_after;
    use super::*;
    use crate::games::tictactoe::{Move, Position};

    #[test]
    fn test_empty_game_holds() {
        assert!(AlternatingTurnInvariant::holds(&session_after(&[])));
    }

    #[test]
    fn test_alternating_sequence_holds() {
        let session = session_after(&[(0, 0), (1, 1), (0, 2), (2, 0), (2, 2)]);
        assert!(AlternatingTurnInvariant::holds(&session));
        assert_eq!(session.current_turn(), Player::B);
    }

    #[test]
    fn test_finished_game_keeps_last_mover() {
        let session = session_after(&[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert!(AlternatingTurnInvariant::holds(&session));
    }

    #[test]
    fn test_same_player_twice_violates() {
        let mut session = session_after(&[(0, 0)]);
        session.history.push(Move::new(Player::A, Position::CENTER));
        assert!(!AlternatingTurnInvariant::holds(&session));
    }
}

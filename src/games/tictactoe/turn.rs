//! Turn authority: whose move is currently acceptable.

use super::Player;
use tracing::{debug, instrument};

/// Server-owned record of whose turn it is.
///
/// Anyone may read it; only the session flips it, and only right after a
/// move that left the game undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnAuthority {
    current: Player,
}

impl TurnAuthority {
    /// Turn authority with player A to move.
    pub fn new() -> Self {
        Self { current: Player::A }
    }

    /// Returns the player whose move is acceptable.
    pub fn current(&self) -> Player {
        self.current
    }

    /// Flips to the other player and returns the new value.
    #[instrument(skip(self), fields(from = %self.current))]
    pub(crate) fn advance(&mut self) -> Player {
        self.current = self.current.opponent();
        debug!(to = %self.current, "Turn advanced");
        self.current
    }

    /// Resets to player A.
    pub(crate) fn reset(&mut self) {
        self.current = Player::A;
    }
}

impl Default for TurnAuthority {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_a() {
        assert_eq!(TurnAuthority::new().current(), Player::A);
    }

    #[test]
    fn test_advance_alternates() {
        let mut turn = TurnAuthority::new();
        let seen: Vec<Player> = (0..4).map(|_| turn.advance()).collect();
        assert_eq!(seen, vec![Player::B, Player::A, Player::B, Player::A]);
    }

    #[test]
    fn test_reset_returns_to_a() {
        let mut turn = TurnAuthority::new();
        turn.advance();
        turn.reset();
        assert_eq!(turn.current(), Player::A);
    }
}

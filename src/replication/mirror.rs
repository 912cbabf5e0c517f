//! Client-side read-only mirror of the authoritative session.

use super::messages::ServerMessage;
use crate::events::{Observers, SessionEvent, SessionObserver};
use crate::games::tictactoe::{Board, Outcome, Player, Position, Square};
use crate::session::SessionPhase;
use tracing::{debug, instrument, warn};

/// Local copy of replicated state.
///
/// Only [`ClientMirror::apply`] changes it, and only in response to frames
/// from the server. Local observers receive the same events the server's
/// observers did, in the same order.
#[derive(Debug)]
pub struct ClientMirror {
    seat: Option<Player>,
    phase: SessionPhase,
    board: Board,
    turn: Option<Player>,
    outcome: Outcome,
    observers: Observers,
}

impl ClientMirror {
    /// Creates a mirror with no seat and an empty board.
    pub fn new() -> Self {
        Self {
            seat: None,
            phase: SessionPhase::AwaitingPlayers,
            board: Board::new(),
            turn: None,
            outcome: Outcome::Undecided,
            observers: Observers::new(),
        }
    }

    /// Seat assigned by the server.
    pub fn seat(&self) -> Option<Player> {
        self.seat
    }

    /// Last replicated phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Last replicated board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Last replicated turn, if the game has started.
    pub fn turn(&self) -> Option<Player> {
        self.turn
    }

    /// Outcome announced by the server.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Registers a local observer.
    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.subscribe(observer);
    }

    /// Advisory check: would the server likely accept this proposal?
    ///
    /// Never authoritative. The server re-validates everything.
    pub fn can_propose(&self, position: Position) -> bool {
        self.phase == SessionPhase::Active
            && self.seat.is_some()
            && self.seat == self.turn
            && self.board.is_empty(position)
    }

    /// Applies a server frame and re-fires it locally.
    ///
    /// `GameStarted` is followed locally by `TurnChanged(A)`, so observers
    /// that track the turn see it from the first move. Returns the session
    /// event the frame carried, if any.
    #[instrument(skip(self))]
    pub fn apply(&mut self, message: &ServerMessage) -> Option<SessionEvent> {
        let event = match *message {
            ServerMessage::Welcome { seat } => {
                debug!(%seat, "Seat assigned");
                self.seat = Some(seat);
                return None;
            }
            ServerMessage::SessionFull => {
                warn!("Server refused connection: session full");
                return None;
            }
            ServerMessage::GameStarted => {
                self.phase = SessionPhase::Active;
                self.turn = Some(Player::A);
                self.observers.publish(SessionEvent::GameStarted);
                self.observers.publish(SessionEvent::TurnChanged(Player::A));
                return Some(SessionEvent::GameStarted);
            }
            ServerMessage::BoardChanged { row, col, square } => {
                let position = match Position::new(row, col) {
                    Ok(position) => position,
                    Err(rejection) => {
                        warn!(%rejection, "Ignoring board change off the board");
                        return None;
                    }
                };
                let Square::Occupied(player) = square else {
                    warn!(%position, "Ignoring board change back to empty");
                    return None;
                };
                if let Err(rejection) = self.board.set(position, player) {
                    warn!(%rejection, "Replicated mark conflicts with mirror");
                    return None;
                }
                SessionEvent::BoardChanged { position, square }
            }
            ServerMessage::TurnChanged { player } => {
                self.turn = Some(player);
                SessionEvent::TurnChanged(player)
            }
            ServerMessage::GameEnded { outcome } => {
                self.phase = SessionPhase::Finished;
                self.outcome = outcome;
                SessionEvent::GameEnded(outcome)
            }
        };
        self.observers.publish(event);
        Some(event)
    }
}

impl Default for ClientMirror {
    fn default() -> Self {
        Self::new()
    }
}

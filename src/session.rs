//! Authoritative game session.
//!
//! One `GameSession` is built per match and handed to whoever drives it
//! (the replication server's actor, or a test). It owns the board and the
//! turn authority, validates every proposal, and publishes each accepted
//! change to its observers.

use crate::events::{Observers, SessionEvent, SessionObserver};
use crate::games::tictactoe::{
    evaluate, Board, Move, Outcome, Player, Position, Rejection, Square,
    TurnAuthority,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Connection-scoped identifier for a participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[display("participant-{}", _0)]
pub struct ParticipantId(pub u64);

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum SessionPhase {
    /// Fewer than two participants registered.
    AwaitingPlayers,
    /// Moves are being accepted.
    Active,
    /// The outcome is decided; the board is read-only.
    Finished,
}

/// Why a membership change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MembershipError {
    /// Both seats are taken, or the game already started.
    #[display("Session already has 2 players")]
    SessionFull,
    /// The participant already holds a seat.
    #[display("{} is already seated", _0)]
    AlreadySeated(ParticipantId),
    /// The participant never joined.
    #[display("{} is not part of this session", _0)]
    UnknownParticipant(ParticipantId),
}

impl std::error::Error for MembershipError {}

/// Summary of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveApplied {
    /// The move as applied.
    pub action: Move,
    /// Outcome after the move.
    pub outcome: Outcome,
}

/// Seat assignments. A seat, once given, belongs to that participant for the
/// rest of the session unless it is vacated before the game starts.
#[derive(Debug, Clone, Default)]
struct Seats {
    a: Option<ParticipantId>,
    b: Option<ParticipantId>,
}

impl Seats {
    fn seat_of(&self, id: ParticipantId) -> Option<Player> {
        if self.a == Some(id) {
            Some(Player::A)
        } else if self.b == Some(id) {
            Some(Player::B)
        } else {
            None
        }
    }

    fn is_full(&self) -> bool {
        self.a.is_some() && self.b.is_some()
    }
}

/// A game session with two players.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    phase: SessionPhase,
    pub(crate) board: Board,
    pub(crate) history: Vec<Move>,
    turn: TurnAuthority,
    seats: Seats,
    connected: usize,
    observers: Observers,
}

impl GameSession {
    /// Creates an empty session waiting for players.
    #[instrument]
    pub fn new(id: SessionId) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            phase: SessionPhase::AwaitingPlayers,
            board: Board::new(),
            history: Vec::new(),
            turn: TurnAuthority::new(),
            seats: Seats::default(),
            connected: 0,
            observers: Observers::new(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Read-only view of the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Accepted moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Whose move is currently acceptable.
    pub fn current_turn(&self) -> Player {
        self.turn.current()
    }

    /// Outcome derived from the current board.
    pub fn outcome(&self) -> Outcome {
        evaluate(&self.board)
    }

    /// Number of participants currently connected.
    pub fn participant_count(&self) -> usize {
        self.connected
    }

    /// Seat held by a participant, if any.
    pub fn seat_of(&self, id: ParticipantId) -> Option<Player> {
        self.seats.seat_of(id)
    }

    /// Registers an observer; it sees every event published after this call.
    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.subscribe(observer);
    }

    /// Registers a participant and returns its seat.
    ///
    /// The first participant gets A, the second B. The second registration
    /// starts the game: turn goes to A and `GameStarted` is published.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn participant_joined(&mut self, id: ParticipantId) -> Result<Player, MembershipError> {
        if self.seats.seat_of(id).is_some() {
            warn!(participant = %id, "Participant tried to join twice");
            return Err(MembershipError::AlreadySeated(id));
        }
        if self.phase != SessionPhase::AwaitingPlayers || self.seats.is_full() {
            warn!(participant = %id, phase = %self.phase, "Session already has 2 players");
            return Err(MembershipError::SessionFull);
        }

        let seat = if self.seats.a.is_none() {
            self.seats.a = Some(id);
            Player::A
        } else {
            self.seats.b = Some(id);
            Player::B
        };
        self.connected += 1;
        info!(participant = %id, %seat, "Registered participant");

        if self.seats.is_full() {
            self.start();
        }
        Ok(seat)
    }

    /// Records a departure.
    ///
    /// Before the game starts the seat is freed for the next connector.
    /// Afterwards seats are permanent and the game state is untouched.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn participant_left(&mut self, id: ParticipantId) -> Result<Player, MembershipError> {
        let seat = self.seats.seat_of(id).ok_or_else(|| {
            debug!(participant = %id, "Departure from unseated participant");
            MembershipError::UnknownParticipant(id)
        })?;

        self.connected = self.connected.saturating_sub(1);
        if self.phase == SessionPhase::AwaitingPlayers {
            match seat {
                Player::A => self.seats.a = None,
                Player::B => self.seats.b = None,
            }
            info!(participant = %id, %seat, "Seat freed before game start");
        } else {
            info!(
                participant = %id,
                %seat,
                remaining = self.connected,
                "Participant left, seat stays reserved"
            );
        }
        Ok(seat)
    }

    /// Validates and applies a proposed move.
    ///
    /// Checks run in order: coordinates, session active, requester's turn,
    /// square empty. Any failure leaves the session untouched and publishes
    /// nothing; the returned [`Rejection`] is for local logging only.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn propose_move(
        &mut self,
        requester: Player,
        row: usize,
        col: usize,
    ) -> Result<MoveApplied, Rejection> {
        let result = self.try_apply(requester, row, col);
        match &result {
            Ok(applied) => info!(
                action = %applied.action,
                outcome = %applied.outcome,
                "Move completed successfully"
            ),
            Err(rejection) => warn!(%requester, row, col, %rejection, "Proposal rejected"),
        }
        result
    }

    fn try_apply(
        &mut self,
        requester: Player,
        row: usize,
        col: usize,
    ) -> Result<MoveApplied, Rejection> {
        let position = Position::new(row, col)?;

        if self.phase != SessionPhase::Active {
            return Err(Rejection::SessionNotActive);
        }
        if requester != self.turn.current() {
            return Err(Rejection::NotYourTurn(requester));
        }
        self.board.set(position, requester)?;

        let action = Move::new(requester, position);
        self.history.push(action);

        let outcome = evaluate(&self.board);
        self.observers.publish(SessionEvent::BoardChanged {
            position,
            square: Square::Occupied(requester),
        });

        if outcome.is_decided() {
            self.phase = SessionPhase::Finished;
            info!(%outcome, "Game finished");
            self.observers.publish(SessionEvent::GameEnded(outcome));
        } else {
            let next = self.turn.advance();
            self.observers.publish(SessionEvent::TurnChanged(next));
        }

        #[cfg(debug_assertions)]
        crate::games::tictactoe::invariants::verify(self);

        Ok(MoveApplied { action, outcome })
    }

    fn start(&mut self) {
        self.phase = SessionPhase::Active;
        self.turn.reset();
        info!(session_id = %self.id, first = %self.turn.current(), "Game started");
        self.observers.publish(SessionEvent::GameStarted);
    }
}

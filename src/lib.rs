//! Strictly Replica library - server-authoritative tic-tac-toe
//!
//! A two-player game session whose state lives on one server and is
//! replicated to clients as change notifications.
//!
//! # Architecture
//!
//! - **Games**: board, win/draw evaluation, turn authority
//! - **Session**: lifecycle state machine that validates every proposal
//! - **Events**: ordered observers receiving replicated changes
//! - **Replication**: TCP server actor, client and read-only client mirror
//!
//! # Example
//!
//! ```
//! use strictly_replica::{GameSession, Outcome, ParticipantId, Player};
//!
//! let mut session = GameSession::new("demo".to_string());
//! session.participant_joined(ParticipantId(1)).unwrap();
//! session.participant_joined(ParticipantId(2)).unwrap();
//!
//! session.propose_move(Player::A, 1, 1).unwrap();
//! assert!(session.propose_move(Player::A, 0, 0).is_err()); // B's turn
//! assert_eq!(session.outcome(), Outcome::Undecided);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod events;
mod games;
mod session;

/// Replication channel: wire protocol, server, client, mirror.
pub mod replication;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Notifications
pub use events::{ChannelObserver, Observers, SessionEvent, SessionObserver};

// Crate-level exports - Session state machine
pub use session::{
    GameSession, MembershipError, MoveApplied, ParticipantId, SessionId, SessionPhase,
};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    evaluate, invariants, rules, Board, Move, Outcome, Player, Position, Rejection, Square,
    TurnAuthority,
};

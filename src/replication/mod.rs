//! Replication channel.
//!
//! Clients send proposals; the server validates them against the single
//! authoritative session and broadcasts the resulting changes to every
//! connection, where a [`ClientMirror`] applies them read-only.
//!
//! Frames are newline-delimited JSON over TCP. Redelivered proposals are
//! filtered by their per-connection sequence number.

mod client;
mod error;
mod messages;
mod mirror;
mod server;

pub use client::ReplicaClient;
pub use error::ReplicationError;
pub use messages::{decode, encode, ClientMessage, ServerMessage, MAX_FRAME_LEN};
pub use mirror::ClientMirror;
pub use server::ReplicaServer;

//! Transport error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Replication transport error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Replication error: {} at {}:{}", message, file, line)]
pub struct ReplicationError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ReplicationError {
    /// Creates a new replication error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for ReplicationError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for ReplicationError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Malformed frame: {}", err))
    }
}

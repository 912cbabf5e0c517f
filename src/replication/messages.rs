//! Wire protocol: newline-delimited JSON frames.

use super::error::ReplicationError;
use crate::events::SessionEvent;
use crate::games::tictactoe::{Outcome, Player, Square};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest frame accepted, excluding the trailing newline.
pub const MAX_FRAME_LEN: usize = 4096;

/// Frames sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Proposal to place a mark.
    ///
    /// `seq` must strictly increase per connection; the server drops any
    /// frame that does not, which makes redelivery harmless.
    Propose {
        /// Per-connection sequence number.
        seq: u64,
        /// Seat the client claims to hold.
        player: Player,
        /// Target row.
        row: usize,
        /// Target column.
        col: usize,
    },
}

/// Frames sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Seat assigned to this connection.
    Welcome {
        /// Assigned seat.
        seat: Player,
    },
    /// The session refused this connection.
    SessionFull,
    /// Both seats are filled; A moves first.
    GameStarted,
    /// A square changed.
    BoardChanged {
        /// Row of the square.
        row: usize,
        /// Column of the square.
        col: usize,
        /// New state.
        square: Square,
    },
    /// Turn passed to `player`.
    TurnChanged {
        /// Player now to move.
        player: Player,
    },
    /// The game is over.
    GameEnded {
        /// Final outcome.
        outcome: Outcome,
    },
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::GameStarted => ServerMessage::GameStarted,
            SessionEvent::BoardChanged { position, square } => ServerMessage::BoardChanged {
                row: position.row(),
                col: position.col(),
                square,
            },
            SessionEvent::TurnChanged(player) => ServerMessage::TurnChanged { player },
            SessionEvent::GameEnded(outcome) => ServerMessage::GameEnded { outcome },
        }
    }
}

/// Serializes a frame, terminated by `\n`.
pub fn encode<T: Serialize>(message: &T) -> Result<String, ReplicationError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Parses one frame (without its trailing newline).
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, ReplicationError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Reads one newline-terminated frame, at most [`MAX_FRAME_LEN`] bytes.
///
/// Partial input is kept in `pending` between calls, so the future can be
/// dropped mid-frame (e.g. in `select!`) without losing bytes. Returns
/// `None` at end of stream; an unterminated tail is discarded. A frame
/// longer than the limit is an error and the stream should be abandoned.
pub(crate) async fn read_frame<R>(
    reader: &mut R,
    pending: &mut Vec<u8>,
) -> Result<Option<String>, ReplicationError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let budget = (MAX_FRAME_LEN + 1).saturating_sub(pending.len()) as u64;
        let read = (&mut *reader)
            .take(budget)
            .read_until(b'\n', pending)
            .await?;

        if pending.last() == Some(&b'\n') {
            let frame = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            return Ok(Some(frame));
        }
        if pending.len() > MAX_FRAME_LEN {
            let len = pending.len();
            pending.clear();
            return Err(ReplicationError::new(format!(
                "Frame exceeds {} bytes (read {} without newline)",
                MAX_FRAME_LEN, len
            )));
        }
        if read == 0 {
            pending.clear();
            return Ok(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Position;
    use tokio::io::BufReader;

    #[test]
    fn test_propose_wire_shape() {
        let frame = encode(&ClientMessage::Propose {
            seq: 3,
            player: Player::B,
            row: 2,
            col: 1,
        })
        .unwrap();
        assert_eq!(
            frame,
            "{\"type\":\"propose\",\"seq\":3,\"player\":\"b\",\"row\":2,\"col\":1}\n"
        );
    }

    #[test]
    fn test_board_changed_from_event() {
        let message = ServerMessage::from(SessionEvent::BoardChanged {
            position: Position::BOTTOM_RIGHT,
            square: Square::Occupied(Player::A),
        });
        assert_eq!(
            message,
            ServerMessage::BoardChanged {
                row: 2,
                col: 2,
                square: Square::Occupied(Player::A),
            }
        );
        let decoded: ServerMessage = decode(&encode(&message).unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_garbage_frame_is_error() {
        assert!(decode::<ClientMessage>("{\"type\":\"shout\"}").is_err());
        assert!(decode::<ClientMessage>("not json").is_err());
    }

    #[tokio::test]
    async fn test_read_frame_splits_lines() {
        let input: &[u8] = b"{\"type\":\"game_started\"}\n\npartial";
        let mut reader = BufReader::new(input);
        let mut pending = Vec::new();

        let first = read_frame(&mut reader, &mut pending).await.unwrap();
        assert_eq!(first.as_deref(), Some("{\"type\":\"game_started\"}\n"));
        assert_eq!(
            decode::<ServerMessage>(&first.unwrap()).unwrap(),
            ServerMessage::GameStarted
        );
        let blank = read_frame(&mut reader, &mut pending).await.unwrap();
        assert_eq!(blank.as_deref(), Some("\n"));
        assert_eq!(read_frame(&mut reader, &mut pending).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut input = vec![b'x'; MAX_FRAME_LEN + 10];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        let mut pending = Vec::new();

        let result = read_frame(&mut reader, &mut pending).await;
        assert!(result.is_err());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_frame_at_limit_accepted() {
        let mut input = vec![b' '; MAX_FRAME_LEN];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        let mut pending = Vec::new();

        let frame = read_frame(&mut reader, &mut pending).await.unwrap();
        assert_eq!(frame.map(|line| line.len()), Some(MAX_FRAME_LEN + 1));
    }
}

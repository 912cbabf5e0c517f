//! Replication client: proposes moves and keeps a local mirror.

use super::error::ReplicationError;
use super::messages::{decode, encode, read_frame, ClientMessage, ServerMessage};
use super::mirror::ClientMirror;
use crate::games::tictactoe::Player;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Connection to a replica server.
#[derive(Debug)]
pub struct ReplicaClient {
    reader: BufReader<OwnedReadHalf>,
    pending: Vec<u8>,
    writer: OwnedWriteHalf,
    mirror: ClientMirror,
    next_seq: u64,
}

impl ReplicaClient {
    /// Connects and waits for the server to assign a seat.
    ///
    /// Fails if the server reports the session full or hangs up first.
    #[instrument]
    pub async fn connect(addr: &str) -> Result<Self, ReplicationError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            pending: Vec::new(),
            writer,
            mirror: ClientMirror::new(),
            next_seq: 0,
        };

        match client.next_message().await? {
            Some(ServerMessage::Welcome { seat }) => {
                info!(%seat, "Joined session");
                Ok(client)
            }
            Some(ServerMessage::SessionFull) => Err(ReplicationError::new("Session is full")),
            Some(other) => Err(ReplicationError::new(format!(
                "Expected welcome, got {:?}",
                other
            ))),
            None => Err(ReplicationError::new(
                "Server closed connection before assigning a seat",
            )),
        }
    }

    /// Seat assigned by the server.
    pub fn seat(&self) -> Option<Player> {
        self.mirror.seat()
    }

    /// Read-only view of replicated state.
    pub fn mirror(&self) -> &ClientMirror {
        &self.mirror
    }

    /// Proposes a mark in this connection's own seat.
    ///
    /// Returns the sequence number used. Acceptance is only ever visible as a
    /// later `BoardChanged`; rejection is silent.
    pub async fn propose(&mut self, row: usize, col: usize) -> Result<u64, ReplicationError> {
        let seat = self
            .seat()
            .ok_or_else(|| ReplicationError::new("No seat assigned"))?;
        self.propose_as(seat, row, col).await
    }

    /// Proposes a mark while claiming an arbitrary seat.
    #[instrument(skip(self))]
    pub async fn propose_as(
        &mut self,
        player: Player,
        row: usize,
        col: usize,
    ) -> Result<u64, ReplicationError> {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.send(&ClientMessage::Propose {
            seq,
            player,
            row,
            col,
        })
        .await?;
        Ok(seq)
    }

    /// Writes a raw frame.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ReplicationError> {
        debug!(?message, "Sending frame");
        self.writer.write_all(encode(message)?.as_bytes()).await?;
        Ok(())
    }

    /// Reads the next server frame and applies it to the mirror.
    ///
    /// Malformed frames are logged and skipped; an oversized frame is an
    /// error. Returns `None` once the server closes the connection.
    /// Cancel-safe.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, ReplicationError> {
        loop {
            let Some(line) = read_frame(&mut self.reader, &mut self.pending).await? else {
                debug!("Server closed connection");
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode::<ServerMessage>(&line) {
                Ok(message) => {
                    self.mirror.apply(&message);
                    return Ok(Some(message));
                }
                Err(error) => warn!(%error, "Skipping malformed frame"),
            }
        }
    }

    /// Closes the write side, signalling departure.
    pub async fn close(mut self) -> Result<(), ReplicationError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

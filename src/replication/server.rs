//! Authoritative replication server.
//!
//! One task (the session actor) owns the [`GameSession`] and handles inbound
//! events strictly one at a time, in arrival order. Connection tasks only
//! parse frames and forward them; they never touch game state.

use super::error::ReplicationError;
use super::messages::{decode, encode, read_frame, ClientMessage, ServerMessage};
use crate::events::{ChannelObserver, SessionEvent};
use crate::games::tictactoe::Rejection;
use crate::session::{GameSession, ParticipantId};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver};
use tracing::{debug, info, instrument, warn};

const INBOUND_CAPACITY: usize = 256;
/// Frames queued per connection before it is considered stalled.
const OUTBOX_CAPACITY: usize = 64;

/// Events delivered to the session actor.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A connection opened; `outbox` feeds its writer.
    ///
    /// The actor drops the outbox when it refuses or gives up on the
    /// connection, which ends the writer and then the reader.
    Joined {
        id: ParticipantId,
        outbox: Sender<ServerMessage>,
    },
    /// A connection closed.
    Left { id: ParticipantId },
    /// A frame arrived on a connection.
    Proposal {
        id: ParticipantId,
        message: ClientMessage,
    },
}

/// Serialized owner of the session plus the outbound fan-out.
#[derive(Debug)]
pub(crate) struct SessionActor {
    session: GameSession,
    events: UnboundedReceiver<SessionEvent>,
    outboxes: BTreeMap<ParticipantId, Sender<ServerMessage>>,
    last_seq: HashMap<ParticipantId, u64>,
    rejections: u64,
}

impl SessionActor {
    pub(crate) fn new(mut session: GameSession) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        session.subscribe(ChannelObserver::new(tx));
        Self {
            session,
            events,
            outboxes: BTreeMap::new(),
            last_seq: HashMap::new(),
            rejections: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &GameSession {
        &self.session
    }

    /// Processes inbound events until every sender is gone.
    #[instrument(skip_all, fields(session_id = %self.session.id()))]
    pub(crate) async fn run(mut self, mut inbound: Receiver<Inbound>) {
        info!("Session actor started");
        while let Some(event) = inbound.recv().await {
            self.handle(event);
        }
        info!(rejections = self.rejections, "Session actor stopped");
    }

    /// Handles one inbound event and flushes whatever the session published.
    pub(crate) fn handle(&mut self, event: Inbound) {
        match event {
            Inbound::Joined { id, outbox } => self.on_joined(id, outbox),
            Inbound::Left { id } => self.on_left(id),
            Inbound::Proposal { id, message } => self.on_proposal(id, message),
        }
        self.flush();
    }

    fn on_joined(&mut self, id: ParticipantId, outbox: Sender<ServerMessage>) {
        match self.session.participant_joined(id) {
            Ok(seat) => {
                if deliver(id, &outbox, ServerMessage::Welcome { seat }) {
                    self.outboxes.insert(id, outbox);
                }
            }
            Err(error) => {
                info!(participant = %id, %error, "Turning connection away");
                deliver(id, &outbox, ServerMessage::SessionFull);
            }
        }
    }

    fn on_left(&mut self, id: ParticipantId) {
        self.outboxes.remove(&id);
        self.last_seq.remove(&id);
        if let Err(error) = self.session.participant_left(id) {
            debug!(participant = %id, %error, "Departure ignored");
        }
    }

    fn on_proposal(&mut self, id: ParticipantId, message: ClientMessage) {
        let ClientMessage::Propose {
            seq,
            player,
            row,
            col,
        } = message;

        let Some(seat) = self.session.seat_of(id) else {
            warn!(participant = %id, "Proposal from connection without a seat");
            self.rejections += 1;
            return;
        };
        if player != seat {
            let rejection = Rejection::ImpersonatedSeat {
                seat,
                claimed: player,
            };
            warn!(participant = %id, %rejection, "Proposal rejected");
            self.rejections += 1;
            return;
        }
        if let Some(last) = self.last_seq.get(&id)
            && seq <= *last
        {
            debug!(participant = %id, seq, last, "Dropping duplicate proposal");
            return;
        }
        self.last_seq.insert(id, seq);

        if self.session.propose_move(player, row, col).is_err() {
            self.rejections += 1;
        }
    }

    fn flush(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            let frame = ServerMessage::from(event);
            debug!(?frame, recipients = self.outboxes.len(), "Broadcasting");
            self.outboxes.retain(|id, outbox| deliver(*id, outbox, frame));
        }
    }
}

/// Queues a frame; false means the connection should be dropped.
fn deliver(id: ParticipantId, outbox: &Sender<ServerMessage>, frame: ServerMessage) -> bool {
    match outbox.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(participant = %id, ?frame, "Outbox full, dropping stalled connection");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(participant = %id, ?frame, "Writer gone, frame dropped");
            false
        }
    }
}

/// TCP front end for a single session.
#[derive(Debug)]
pub struct ReplicaServer {
    listener: TcpListener,
    session: GameSession,
}

impl ReplicaServer {
    /// Binds the listener. The session is served once [`Self::run`] starts.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub async fn bind(addr: &str, session: GameSession) -> Result<Self, ReplicationError> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Replica server listening");
        Ok(Self { listener, session })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ReplicationError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the listener fails.
    ///
    /// The first connection becomes player A, the second player B; any
    /// later connection is told the session is full.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub async fn run(self) -> Result<(), ReplicationError> {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let actor = tokio::spawn(SessionActor::new(self.session).run(inbound_rx));

        let mut next_id = 0u64;
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    warn!(%error, "Accept failed, stopping server");
                    actor.abort();
                    return Err(error.into());
                }
            };
            next_id += 1;
            let id = ParticipantId(next_id);
            info!(participant = %id, %peer, "Accepted connection");
            tokio::spawn(serve_connection(id, stream, inbound_tx.clone()));
        }
    }
}

/// Reads frames from one connection and forwards them to the actor.
///
/// Ends when the peer closes, sends an oversized frame, or the actor drops
/// this connection's outbox (refused join or stalled writer).
#[instrument(skip(stream, inbound))]
async fn serve_connection(id: ParticipantId, stream: TcpStream, inbound: Sender<Inbound>) {
    let (read_half, write_half) = stream.into_split();
    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);

    let mut writer = tokio::spawn(async move {
        if let Err(error) = write_frames(write_half, outbox_rx).await {
            warn!(participant = %id, %error, "Writer stopped");
        }
    });

    if inbound
        .send(Inbound::Joined {
            id,
            outbox: outbox_tx,
        })
        .await
        .is_err()
    {
        warn!("Session actor gone, dropping connection");
        return;
    }

    let mut reader = BufReader::new(read_half);
    let mut pending = Vec::new();
    loop {
        let frame = tokio::select! {
            frame = read_frame(&mut reader, &mut pending) => frame,
            _ = &mut writer => {
                debug!("Outbox closed, dropping connection");
                break;
            }
        };
        match frame {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match decode::<ClientMessage>(&line) {
                Ok(message) => {
                    debug!(?message, "Frame received");
                    if inbound.send(Inbound::Proposal { id, message }).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(%error, "Skipping malformed frame"),
            },
            Ok(None) => {
                debug!("Peer closed connection");
                break;
            }
            Err(error) => {
                warn!(%error, "Read failed");
                break;
            }
        }
    }

    if inbound.send(Inbound::Left { id }).await.is_err() {
        debug!("Session actor gone before departure was recorded");
    }
}

async fn write_frames(
    mut writer: OwnedWriteHalf,
    mut outbox: Receiver<ServerMessage>,
) -> Result<(), ReplicationError> {
    while let Some(message) = outbox.recv().await {
        writer.write_all(encode(&message)?.as_bytes()).await?;
    }
    writer.shutdown().await?;
    Ok(())
}

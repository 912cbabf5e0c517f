//! Session notifications and the observers that consume them.
//!
//! The session publishes every replicated state change through an ordered
//! list of observers. UI adapters, the network fan-out and test recorders all
//! subscribe the same way; nothing looks the session up globally.

use crate::games::tictactoe::{Outcome, Player, Position, Square};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument};

/// A replicated state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Two participants are present; player A moves first.
    GameStarted,
    /// A square received a mark.
    BoardChanged {
        /// Square that changed.
        position: Position,
        /// Its new state.
        square: Square,
    },
    /// The turn passed to this player.
    TurnChanged(Player),
    /// The game is over.
    GameEnded(Outcome),
}

/// Receives session notifications in publication order.
pub trait SessionObserver: Send {
    /// Called once per event, synchronously, while the session is mid-update.
    fn notify(&mut self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionEvent) + Send,
{
    fn notify(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Forwards events onto an unbounded tokio channel.
///
/// A closed receiver is not an error; events are simply dropped.
#[derive(Debug, Clone, derive_new::new)]
pub struct ChannelObserver {
    tx: UnboundedSender<SessionEvent>,
}

impl SessionObserver for ChannelObserver {
    fn notify(&mut self, event: &SessionEvent) {
        if self.tx.send(*event).is_err() {
            debug!(?event, "Observer channel closed, dropping event");
        }
    }
}

/// Ordered set of subscribers.
#[derive(Default)]
pub struct Observers {
    subscribers: Vec<Box<dyn SessionObserver>>,
}

impl Observers {
    /// Creates an empty subscriber list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber; it is notified after all earlier ones.
    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.subscribers.push(Box::new(observer));
    }

    /// Delivers an event to every subscriber in order.
    #[instrument(skip(self), fields(subscribers = self.subscribers.len()))]
    pub fn publish(&mut self, event: SessionEvent) {
        for observer in &mut self.subscribers {
            observer.notify(&event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

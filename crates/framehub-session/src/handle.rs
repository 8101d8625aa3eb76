//! The cloneable handle actors use to talk to a session.

use std::fmt;
use std::sync::Arc;

use framehub_protocol::Envelope;
use framehub_transport::ConnectionId;
use tokio::sync::{mpsc, watch};

use crate::{Mailbox, SessionError};

/// A reference to a live session.
///
/// Cloning is cheap; the lobby, rooms and games all hold clones. Outbound
/// messages go into a bounded queue drained by the session's writer, so
/// enqueueing never touches the network.
#[derive(Clone)]
pub struct SessionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Envelope>,
    owner: Arc<watch::Sender<Mailbox>>,
}

impl SessionHandle {
    /// Creates a handle and the receiving end of its outbound queue.
    pub fn new(
        id: ConnectionId,
        outbound_capacity: usize,
        owner: Mailbox,
    ) -> (Self, mpsc::Receiver<Envelope>) {
        let (outbound, rx) = mpsc::channel(outbound_capacity);
        let (owner, _) = watch::channel(owner);
        (
            Self {
                id,
                outbound,
                owner: Arc::new(owner),
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The mailbox inbound messages are currently delivered to.
    pub fn owner(&self) -> Mailbox {
        self.owner.borrow().clone()
    }

    /// Routes every later inbound message to `owner`.
    ///
    /// A message the reader already handed to the previous owner stays
    /// there.
    pub fn set_owner(&self, owner: Mailbox) {
        let previous = self.owner.send_replace(owner);
        tracing::debug!(
            conn = %self.id,
            from = previous.name(),
            to = self.owner.borrow().name(),
            "session owner changed"
        );
    }

    /// Queues a message, waiting for a free slot.
    ///
    /// # Errors
    /// Returns [`SessionError::Closed`] if the session has terminated.
    pub async fn send(&self, envelope: Envelope) -> Result<(), SessionError> {
        self.outbound
            .send(envelope)
            .await
            .map_err(|_| SessionError::Closed(self.id))
    }

    /// Queues a message only if a slot is free right now.
    ///
    /// # Errors
    /// Returns [`SessionError::QueueFull`] when the queue is full and
    /// [`SessionError::Closed`] if the session has terminated. Either way
    /// the message is dropped.
    pub fn try_send(&self, envelope: Envelope) -> Result<(), SessionError> {
        self.outbound.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::QueueFull(self.id),
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed(self.id),
        })
    }

    /// Returns `true` once the session's writer is gone.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("owner", &self.owner.borrow().name())
            .finish()
    }
}

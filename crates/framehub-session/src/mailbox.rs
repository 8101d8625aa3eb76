//! Actor inboxes that sessions deliver decoded messages to.

use std::fmt;
use std::sync::Arc;

use framehub_protocol::Envelope;
use tokio::sync::mpsc;

use crate::{SessionError, SessionHandle};

/// One decoded client message, tagged with the session it came from so the
/// owner can reply.
#[derive(Debug)]
pub struct Inbound {
    pub session: SessionHandle,
    pub envelope: Envelope,
}

/// The sending side of an actor's inbox.
///
/// Every session points at exactly one mailbox at a time: the lobby's while
/// the player is in the lobby, the game's once its room starts.
#[derive(Clone)]
pub struct Mailbox {
    name: Arc<str>,
    tx: mpsc::Sender<Inbound>,
}

impl Mailbox {
    /// Creates a bounded inbox. `name` shows up in logs and errors.
    pub fn channel(
        name: impl Into<Arc<str>>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Inbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hands a message to the owner, waiting for a free slot.
    ///
    /// # Errors
    /// Returns [`SessionError::OwnerGone`] if the receiver has been closed
    /// or dropped.
    pub async fn deliver(&self, inbound: Inbound) -> Result<(), SessionError> {
        self.tx
            .send(inbound)
            .await
            .map_err(|_| SessionError::OwnerGone(self.name.to_string()))
    }

    /// Returns `true` once the owner stopped accepting messages.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Returns `true` if both mailboxes feed the same inbox.
    pub fn same_inbox(&self, other: &Mailbox) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

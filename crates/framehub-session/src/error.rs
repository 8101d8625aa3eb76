//! Error types for the session layer.

use std::time::Duration;

use framehub_protocol::ProtocolError;
use framehub_transport::ConnectionId;

/// Errors that can occur while running or talking to a session.
///
/// Everything raised from inside [`Session::run`](crate::Session::run) is
/// fatal to that one session. The enqueue errors (`QueueFull`, `Closed`)
/// are returned to whichever actor tried to send, which decides whether to
/// log, retry, or give up.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying connection failed to read, write, or close.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Nothing arrived within the read deadline.
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// A write didn't complete within the write deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The session's outbound queue has no free slot.
    #[error("outbound queue of {0} is full")]
    QueueFull(ConnectionId),

    /// The session has terminated; its outbound queue is gone.
    #[error("session {0} is closed")]
    Closed(ConnectionId),

    /// The owner's inbound queue is closed (e.g. its game has ended).
    #[error("{0} is no longer accepting messages")]
    OwnerGone(String),
}

impl SessionError {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}

//! The per-connection task: an inbound loop and an outbound loop over one
//! transport connection.
//!
//! ```text
//!   client ──recv──→ read_loop ──decode──→ owner Mailbox (lobby or game)
//!   client ←─send─── write_loop ←─encode── outbound queue ←── SessionHandle
//! ```
//!
//! Both loops run inside a single `tokio::select!`. Whichever finishes first
//! (error, clean close, or shutdown) tears the other down, and the
//! connection is closed once on the way out.

use std::sync::Arc;

use framehub_protocol::{Codec, Envelope};
use framehub_transport::Connection;
use tokio::sync::mpsc;

use crate::{Inbound, Mailbox, SessionConfig, SessionError, SessionHandle, Shutdown};

/// A connected client.
pub struct Session<C: Connection, K: Codec> {
    conn: C,
    codec: Arc<K>,
    config: SessionConfig,
    handle: SessionHandle,
    outbound: mpsc::Receiver<Envelope>,
}

impl<C: Connection, K: Codec> Session<C, K> {
    /// Wraps a connection. Inbound messages go to `owner` until someone
    /// calls [`SessionHandle::set_owner`].
    pub fn new(
        conn: C,
        codec: Arc<K>,
        config: SessionConfig,
        owner: Mailbox,
    ) -> (Self, SessionHandle) {
        let (handle, outbound) =
            SessionHandle::new(conn.id(), config.outbound_capacity, owner);
        let session = Self {
            conn,
            codec,
            config,
            handle: handle.clone(),
            outbound,
        };
        (session, handle)
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Runs the session until the client leaves, an error occurs, or
    /// shutdown is signalled.
    ///
    /// # Errors
    /// Returns the error that ended the session. A clean close by the
    /// client and shutdown both return `Ok(())`.
    pub async fn run(self, mut shutdown: Shutdown) -> Result<(), SessionError> {
        let Self {
            conn,
            codec,
            config,
            handle,
            outbound,
        } = self;
        let conn_id = conn.id();
        tracing::debug!(%conn_id, "session started");

        let result = tokio::select! {
            r = read_loop(&conn, codec.as_ref(), &config, &handle) => r,
            r = write_loop(&conn, codec.as_ref(), &config, outbound) => r,
            () = shutdown.cancelled() => {
                tracing::debug!(%conn_id, "session stopping for shutdown");
                Ok(())
            }
        };

        if let Err(e) = conn.close().await {
            tracing::debug!(%conn_id, error = %e, "close failed");
        }

        match &result {
            Ok(()) => tracing::info!(%conn_id, "session ended"),
            Err(e) => tracing::info!(%conn_id, error = %e, "session terminated"),
        }
        result
    }
}

async fn read_loop<C: Connection, K: Codec>(
    conn: &C,
    codec: &K,
    config: &SessionConfig,
    handle: &SessionHandle,
) -> Result<(), SessionError> {
    let conn_id = conn.id();
    loop {
        let data = match tokio::time::timeout(config.read_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed by peer");
                return Ok(());
            }
            Ok(Err(e)) => return Err(SessionError::transport(e)),
            Err(_) => return Err(SessionError::ReadTimeout(config.read_timeout)),
        };

        let envelope = match codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(%conn_id, error = %e, "dropping undecodable message");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if !envelope.is_client_message() {
            tracing::warn!(
                %conn_id,
                kind = envelope.kind(),
                "dropping server-only message sent by client"
            );
            continue;
        }

        let owner = handle.owner();
        tracing::trace!(%conn_id, kind = envelope.kind(), owner = owner.name(), "inbound");
        let inbound = Inbound {
            session: handle.clone(),
            envelope,
        };
        if let Err(e) = owner.deliver(inbound).await {
            tracing::warn!(%conn_id, error = %e, "dropping inbound message");
        }
    }
}

async fn write_loop<C: Connection, K: Codec>(
    conn: &C,
    codec: &K,
    config: &SessionConfig,
    mut outbound: mpsc::Receiver<Envelope>,
) -> Result<(), SessionError> {
    // Every handle clone would have to drop for this to yield None, and the
    // session holds one, so in practice the loop ends via the other branch.
    while let Some(envelope) = outbound.recv().await {
        let bytes = codec.encode(&envelope)?;
        match tokio::time::timeout(config.write_timeout, conn.send(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SessionError::transport(e)),
            Err(_) => return Err(SessionError::WriteTimeout(config.write_timeout)),
        }
    }
    Ok(())
}

//! `FramehubServer` builder and accept loop.
//!
//! Ties the layers together: every accepted connection becomes a
//! [`Session`] owned by the lobby, and the lobby hands sessions to games.

use std::sync::Arc;

use framehub_protocol::Codec;
use framehub_room::{LobbyConfig, RoomManager};
use framehub_session::{Session, SessionConfig, Shutdown};
use framehub_transport::{Connection, Transport, WebSocketTransport};

use crate::FramehubError;

/// Builder for configuring and binding a framehub server.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), framehub::FramehubError> {
/// use framehub::prelude::*;
///
/// let (_trigger, shutdown) = framehub::shutdown::channel();
/// let server = FramehubServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(ProtobufCodec)
///     .await?;
/// server.run(shutdown).await
/// # }
/// ```
pub struct FramehubServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    lobby_config: LobbyConfig,
}

impl FramehubServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            session_config: SessionConfig::default(),
            lobby_config: LobbyConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Binds the listener. Every connection will use `codec`.
    pub async fn build<K: Codec>(self, codec: K) -> Result<FramehubServer<K>, FramehubError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(FramehubServer {
            transport,
            codec: Arc::new(codec),
            session_config: self.session_config,
            lobby_config: self.lobby_config,
        })
    }
}

impl Default for FramehubServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound framehub server. Call [`run`](Self::run) to start serving.
pub struct FramehubServer<K: Codec> {
    transport: WebSocketTransport,
    codec: Arc<K>,
    session_config: SessionConfig,
    lobby_config: LobbyConfig,
}

impl<K: Codec> FramehubServer<K> {
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, FramehubError> {
        Ok(self.transport.local_addr()?)
    }

    /// Starts the lobby and accepts connections until `shutdown` fires.
    ///
    /// Sessions and games run on their own tasks and watch the same
    /// signal, so they stop on their own.
    pub async fn run(mut self, shutdown: Shutdown) -> Result<(), FramehubError> {
        let lobby = RoomManager::new(self.lobby_config, shutdown.clone()).spawn();
        let mut stop = shutdown.clone();
        tracing::info!(addr = ?self.transport.local_addr().ok(), "framehub server running");

        loop {
            tokio::select! {
                () = stop.cancelled() => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let conn_id = conn.id();
                        let (session, _) = Session::new(
                            conn,
                            Arc::clone(&self.codec),
                            self.session_config.clone(),
                            lobby.clone(),
                        );
                        tracing::info!(%conn_id, "client connected");
                        tokio::spawn(session.run(shutdown.clone()));
                    }
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }

        tracing::info!("framehub server stopped");
        Ok(())
    }
}

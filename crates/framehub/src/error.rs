//! Unified error type for the framehub server.

use framehub_protocol::ProtocolError;
use framehub_session::SessionError;
use framehub_transport::TransportError;

/// Top-level error that wraps the layer errors.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum FramehubError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A socket-level failure outside the transport, such as reading the
    /// bound address.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

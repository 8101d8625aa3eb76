//! # framehub
//!
//! A lockstep relay for real-time multiplayer puzzle games.
//!
//! Clients connect over WebSocket, gather in rooms, and once a room starts
//! they send opaque per-frame inputs. The server stamps every input with
//! its own frame counter and, 30 times a second, relays each player's
//! inputs to everyone in the game. It never interprets game state.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session → Lobby → Game
//! ```

mod error;
mod server;

pub use error::FramehubError;
pub use framehub_session::shutdown;
pub use server::{FramehubServer, FramehubServerBuilder};

/// Everything needed to embed a server.
pub mod prelude {
    pub use crate::{FramehubError, FramehubServer, FramehubServerBuilder};
    pub use framehub_game::GameConfig;
    pub use framehub_protocol::{Codec, Envelope, JsonCodec, ProtobufCodec};
    pub use framehub_room::LobbyConfig;
    pub use framehub_session::{SessionConfig, Shutdown, ShutdownTrigger};
    pub use framehub_tick::{TickConfig, TickPolicy};
}

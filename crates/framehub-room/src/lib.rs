//! Rooms and the lobby for framehub.
//!
//! Every new session starts out owned by the lobby, a single
//! [`RoomManager`] task. Players create and join [`Room`]s there; when a
//! room is started the lobby spawns a [`Game`](framehub_game::Game) from
//! its roster and points each member's session at the game.
//!
//! # Key types
//!
//! - [`RoomManager`] — the lobby actor and the player → room index
//! - [`Room`] — a roster plus a [`RoomStatus`]
//! - [`RoomIdGenerator`] — how room ids are allocated ([`SequentialIds`])
//! - [`LobbyConfig`] — queue sizes, the start gate, and game settings

mod config;
mod ids;
mod manager;
mod room;

pub use config::{LobbyConfig, RoomStatus};
pub use ids::{RoomIdGenerator, SequentialIds};
pub use manager::RoomManager;
pub use room::Room;

//! Client sessions for framehub.
//!
//! A [`Session`] owns one transport connection. It decodes what the client
//! sends and hands each message to its current owner, a [`Mailbox`]
//! belonging to the lobby or to a running game. Actors reply through a
//! cloneable [`SessionHandle`], which queues envelopes for the session's
//! writer and lets the lobby move a session into a game with
//! [`SessionHandle::set_owner`].
//!
//! ```text
//! Lobby / Game actors (above)  ← receive Inbound, reply via SessionHandle
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Transport + Protocol (below)
//! ```
//!
//! [`Shutdown`] is the process-wide stop signal every task listens to.

mod config;
mod error;
mod handle;
mod mailbox;
mod session;
pub mod shutdown;

pub use config::SessionConfig;
pub use error::SessionError;
pub use handle::SessionHandle;
pub use mailbox::{Inbound, Mailbox};
pub use session::Session;
pub use shutdown::{Shutdown, ShutdownTrigger};

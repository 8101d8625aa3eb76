//! Lockstep game actor for framehub.
//!
//! When a room starts, the lobby builds a [`Game`] from the room's roster,
//! spawns it, and points every member's session at the game's mailbox.
//! From then on the game:
//!
//! 1. waits until every player reports `GameLoadComplete`, then sends all
//!    of them everyone's load payload at once;
//! 2. stamps each `Input` with the current frame and, 30 times a second,
//!    sends every player the frames it hasn't seen yet;
//! 3. ends on a forced `GameEnd`, or once every player has sent one.

mod config;
mod game;
mod player;

pub use config::{GameConfig, GameStatus};
pub use game::Game;
pub use player::GamePlayer;

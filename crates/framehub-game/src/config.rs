//! Game configuration and lifecycle state.

use framehub_tick::TickConfig;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings applied to every game the lobby spawns.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Capacity of the game's inbound queue, shared by all its sessions.
    pub inbox_capacity: usize,

    /// The frame clock. Defaults to 30 Hz.
    pub tick: TickConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 1024,
            tick: TickConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a game.
///
/// ```text
/// Loading ──(all loaded)──→ Playing ──(ended)──→ Ended
///    └──────────────(forced end)────────────────↗
/// ```
///
/// Transitions only go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Waiting for every player's load-complete.
    Loading,
    /// Frames are ticking.
    Playing,
    /// Terminal. Nothing else is processed.
    Ended,
}

impl GameStatus {
    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Loading, Self::Playing)
                | (Self::Loading, Self::Ended)
                | (Self::Playing, Self::Ended)
        )
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Playing => write!(f, "Playing"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

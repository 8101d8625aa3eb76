//! Lobby configuration and room state.

use framehub_game::GameConfig;

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Configuration for the [`RoomManager`](crate::RoomManager).
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Capacity of the lobby's inbound queue, shared by every session that
    /// isn't in a game.
    pub inbox_capacity: usize,

    /// Players a room needs before it can be started. The default of 1
    /// lets a player start a game alone.
    pub min_players_to_start: usize,

    /// Passed to every game the lobby starts.
    pub game: GameConfig,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 1024,
            min_players_to_start: 1,
            game: GameConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──(StartGame)──→ InGame
/// ```
///
/// A room in game is terminal: it accepts no members and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    InGame,
}

impl RoomStatus {
    /// Returns `true` if players may still enter or leave.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::InGame => write!(f, "InGame"),
        }
    }
}

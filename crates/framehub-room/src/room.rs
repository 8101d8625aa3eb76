//! A room: a named roster of players waiting to start a game together.

use std::collections::BTreeMap;

use framehub_protocol::{LobbyError, PlayerId, RoomId, RoomInfo};
use framehub_session::SessionHandle;

use crate::RoomStatus;

/// A pre-game group of players.
///
/// Rooms are plain data owned by the [`RoomManager`](crate::RoomManager);
/// only the lobby task touches them.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    status: RoomStatus,
    roster: BTreeMap<PlayerId, SessionHandle>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            status: RoomStatus::Waiting,
            roster: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.roster.contains_key(player_id)
    }

    /// Adds a member.
    ///
    /// # Errors
    /// [`LobbyError::PlayerAlreadyInRoom`] if the id is already on the
    /// roster.
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        session: SessionHandle,
    ) -> Result<(), LobbyError> {
        if self.roster.contains_key(&player_id) {
            return Err(LobbyError::PlayerAlreadyInRoom);
        }
        self.roster.insert(player_id, session);
        Ok(())
    }

    /// Removes a member and returns its session.
    ///
    /// # Errors
    /// [`LobbyError::PlayerNotFound`] if the id isn't on the roster.
    pub fn remove_player(
        &mut self,
        player_id: &PlayerId,
    ) -> Result<SessionHandle, LobbyError> {
        self.roster
            .remove(player_id)
            .ok_or(LobbyError::PlayerNotFound)
    }

    /// The room id and member ids, in id order.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            player_ids: self.roster.keys().cloned().collect(),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = (&PlayerId, &SessionHandle)> {
        self.roster.iter()
    }

    pub(crate) fn mark_in_game(&mut self) {
        self.status = RoomStatus::InGame;
    }
}

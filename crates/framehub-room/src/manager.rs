//! The lobby actor: creates rooms, moves players in and out of them, and
//! starts games.

use std::collections::HashMap;

use framehub_game::Game;
use framehub_protocol::{
    CreateRoom, EnterRoom, Envelope, ExitRoom, LobbyError, PlayerId, RoomId,
    RoomInfo, StartGame,
};
use framehub_session::{Inbound, Mailbox, SessionHandle, Shutdown};
use tokio::sync::mpsc;

use crate::{LobbyConfig, Room, RoomIdGenerator, SequentialIds};

/// Owns every room and the player → room index.
///
/// A player is on at most one roster at a time; `player_rooms` is the only
/// record of where each player is, and every handler checks it before
/// touching a roster.
pub struct RoomManager<I: RoomIdGenerator = SequentialIds> {
    config: LobbyConfig,
    ids: I,
    rooms: HashMap<RoomId, Room>,
    player_rooms: HashMap<PlayerId, RoomId>,
    /// Handed to every game the lobby spawns.
    shutdown: Shutdown,
}

impl RoomManager<SequentialIds> {
    /// A lobby numbering rooms `"1"`, `"2"`, ...
    pub fn new(config: LobbyConfig, shutdown: Shutdown) -> Self {
        Self::with_id_generator(config, SequentialIds::default(), shutdown)
    }
}

impl<I: RoomIdGenerator> RoomManager<I> {
    pub fn with_id_generator(config: LobbyConfig, ids: I, shutdown: Shutdown) -> Self {
        Self {
            config,
            ids,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            shutdown,
        }
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<&RoomId> {
        self.player_rooms.get(player_id)
    }

    /// Moves the lobby onto its own task and returns its mailbox. New
    /// sessions should be created with this mailbox as their owner.
    pub fn spawn(self) -> Mailbox {
        let (mailbox, inbox) = Mailbox::channel("lobby", self.config.inbox_capacity);
        tokio::spawn(self.run(inbox));
        mailbox
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<Inbound>) {
        let mut shutdown = self.shutdown.clone();
        tracing::info!("lobby started");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                msg = inbox.recv() => match msg {
                    Some(inbound) => self.handle(inbound).await,
                    None => break,
                },
            }
        }
        tracing::info!(rooms = self.rooms.len(), "lobby stopped");
    }

    /// Processes one lobby command and sends its reply.
    pub async fn handle(&mut self, inbound: Inbound) {
        let Inbound { session, envelope } = inbound;
        match envelope {
            Envelope::CreateRoom(msg) => {
                let result = self.create_room(&msg, &session);
                reply(&session, Envelope::CreateRoomReply(result)).await;
            }
            Envelope::EnterRoom(msg) => {
                let result = self.enter_room(&msg, &session);
                if let Err(e) = &result {
                    tracing::info!(room_id = %msg.room_id, player_id = %msg.player_id, error = %e, "enter room refused");
                }
                reply(&session, Envelope::EnterRoomReply(result.clone())).await;
                if let Ok(info) = result {
                    self.broadcast_roster(&info, &msg.player_id).await;
                }
            }
            Envelope::ExitRoom(msg) => {
                let result = self.exit_room(&msg);
                match &result {
                    Ok(room_id) => {
                        if let Some(info) = self.rooms.get(room_id).map(Room::info) {
                            self.broadcast_roster(&info, &msg.player_id).await;
                        }
                    }
                    Err(e) => {
                        tracing::info!(room_id = %msg.room_id, player_id = %msg.player_id, error = %e, "exit room refused");
                    }
                }
                reply(&session, Envelope::ExitRoomReply(result)).await;
            }
            Envelope::StartGame(msg) => {
                if let Err(e) = self.start_game(&msg).await {
                    tracing::info!(room_id = %msg.room_id, error = %e, "start game refused");
                    reply(&session, Envelope::StartGameReply(Err(e))).await;
                }
            }
            Envelope::Heartbeat(msg) => {
                tracing::trace!(player_id = %msg.player_id, "lobby heartbeat");
            }
            other => {
                tracing::warn!(
                    conn_id = %session.id(),
                    kind = other.kind(),
                    "unexpected message in lobby"
                );
            }
        }
    }

    fn create_room(
        &mut self,
        msg: &CreateRoom,
        session: &SessionHandle,
    ) -> Result<RoomInfo, LobbyError> {
        let player_id = &msg.player_id;
        if let Some(current) = self.player_rooms.get(player_id) {
            tracing::info!(%player_id, room_id = %current, "create room refused, already in a room");
            return Err(LobbyError::AlreadyInRoom);
        }

        let Some(room_id) = self.ids.next_id() else {
            tracing::error!(%player_id, "room ids exhausted");
            return Err(LobbyError::RoomCreationFailed);
        };
        if self.rooms.contains_key(&room_id) {
            tracing::error!(%room_id, "room id already taken");
            return Err(LobbyError::RoomCreationFailed);
        }

        let mut room = Room::new(room_id.clone());
        room.add_player(player_id.clone(), session.clone())?;
        let info = room.info();
        self.rooms.insert(room_id.clone(), room);
        self.player_rooms.insert(player_id.clone(), room_id.clone());
        tracing::info!(%room_id, %player_id, "room created");
        Ok(info)
    }

    fn enter_room(
        &mut self,
        msg: &EnterRoom,
        session: &SessionHandle,
    ) -> Result<RoomInfo, LobbyError> {
        let EnterRoom { room_id, player_id } = msg;
        let room = self.rooms.get_mut(room_id).ok_or(LobbyError::RoomNotFound)?;
        if !room.status().is_open() {
            return Err(LobbyError::RoomAlreadyInGame);
        }
        if room.contains(player_id) {
            return Err(LobbyError::PlayerAlreadyInRoom);
        }
        if self.player_rooms.contains_key(player_id) {
            return Err(LobbyError::AlreadyInRoom);
        }
        room.add_player(player_id.clone(), session.clone())?;
        self.player_rooms.insert(player_id.clone(), room_id.clone());
        tracing::info!(%room_id, %player_id, players = room.len(), "player entered room");
        Ok(room.info())
    }

    fn exit_room(&mut self, msg: &ExitRoom) -> Result<RoomId, LobbyError> {
        let ExitRoom { room_id, player_id } = msg;
        let room = self.rooms.get_mut(room_id).ok_or(LobbyError::RoomNotFound)?;
        if !room.status().is_open() {
            return Err(LobbyError::RoomAlreadyInGame);
        }
        room.remove_player(player_id)?;
        self.player_rooms.remove(player_id);
        tracing::info!(%room_id, %player_id, players = room.len(), "player left room");
        Ok(room_id.clone())
    }

    /// Spawns the room's game and hands every member over to it.
    async fn start_game(&mut self, msg: &StartGame) -> Result<(), LobbyError> {
        let room = self
            .rooms
            .get_mut(&msg.room_id)
            .ok_or(LobbyError::RoomNotFound)?;
        if !room.status().is_open() {
            return Err(LobbyError::RoomAlreadyInGame);
        }
        if room.len() < self.config.min_players_to_start {
            return Err(LobbyError::NotEnoughPlayers {
                required: count(self.config.min_players_to_start),
                present: count(room.len()),
            });
        }

        let game = Game::new(
            room.id().clone(),
            room.members()
                .map(|(player_id, session)| (player_id.clone(), session.clone())),
            self.config.game.clone(),
        );
        let mailbox = game.spawn(self.shutdown.clone());
        room.mark_in_game();
        tracing::info!(room_id = %room.id(), players = room.len(), "game starting");

        let ok = Envelope::StartGameReply(Ok(room.id().clone()));
        for (_, session) in room.members() {
            session.set_owner(mailbox.clone());
            reply(session, ok.clone()).await;
        }
        Ok(())
    }

    /// Sends the new roster to every member except the one who changed it.
    async fn broadcast_roster(&self, info: &RoomInfo, except: &PlayerId) {
        let Some(room) = self.rooms.get(&info.room_id) else {
            return;
        };
        let changed = Envelope::RoomInfoChanged(info.clone());
        for (player_id, session) in room.members() {
            if player_id != except {
                reply(session, changed.clone()).await;
            }
        }
    }
}

/// Queues a lobby message, waiting for room in the session's queue.
async fn reply(session: &SessionHandle, envelope: Envelope) {
    let kind = envelope.kind();
    if let Err(e) = session.send(envelope).await {
        tracing::warn!(conn_id = %session.id(), kind, error = %e, "lobby message not delivered");
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framehub_protocol::Heartbeat;
    use framehub_session::{ShutdownTrigger, shutdown};
    use framehub_transport::ConnectionId;

    use crate::RoomStatus;

    struct Client {
        session: SessionHandle,
        outbound: mpsc::Receiver<Envelope>,
    }

    impl Client {
        fn new(id: u64) -> Self {
            let (lobby, _) = Mailbox::channel("lobby", 1);
            let (session, outbound) = SessionHandle::new(ConnectionId::new(id), 16, lobby);
            Self { session, outbound }
        }

        fn inbound(&self, envelope: Envelope) -> Inbound {
            Inbound {
                session: self.session.clone(),
                envelope,
            }
        }

        fn drain(&mut self) -> Vec<Envelope> {
            let mut out = Vec::new();
            while let Ok(env) = self.outbound.try_recv() {
                out.push(env);
            }
            out
        }
    }

    fn lobby(config: LobbyConfig) -> (RoomManager, ShutdownTrigger) {
        let (trigger, stop) = shutdown::channel();
        (RoomManager::new(config, stop), trigger)
    }

    fn create(player: &str) -> Envelope {
        Envelope::CreateRoom(CreateRoom {
            player_id: player.into(),
        })
    }

    fn enter(room: &str, player: &str) -> Envelope {
        Envelope::EnterRoom(EnterRoom {
            room_id: room.into(),
            player_id: player.into(),
        })
    }

    fn exit(room: &str, player: &str) -> Envelope {
        Envelope::ExitRoom(ExitRoom {
            room_id: room.into(),
            player_id: player.into(),
        })
    }

    fn start(room: &str) -> Envelope {
        Envelope::StartGame(StartGame {
            room_id: room.into(),
        })
    }

    fn info(room: &str, players: &[&str]) -> RoomInfo {
        RoomInfo {
            room_id: room.into(),
            player_ids: players.iter().map(|p| PlayerId::from(*p)).collect(),
        }
    }

    /// Room "1" holding A and B, with both queues drained.
    async fn room_with_two(mgr: &mut RoomManager, a: &mut Client, b: &mut Client) {
        mgr.handle(a.inbound(create("A"))).await;
        mgr.handle(b.inbound(enter("1", "B"))).await;
        a.drain();
        b.drain();
    }

    // =====================================================================
    // CreateRoom
    // =====================================================================

    #[tokio::test]
    async fn test_create_room_makes_requester_sole_member() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);

        mgr.handle(a.inbound(create("A"))).await;

        assert_eq!(a.drain(), vec![Envelope::CreateRoomReply(Ok(info("1", &["A"])))]);
        assert_eq!(mgr.player_room(&"A".into()), Some(&RoomId::from("1")));
    }

    #[tokio::test]
    async fn test_create_room_while_in_room_is_refused() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        mgr.handle(a.inbound(create("A"))).await;
        a.drain();

        mgr.handle(a.inbound(create("A"))).await;
        assert_eq!(
            a.drain(),
            vec![Envelope::CreateRoomReply(Err(LobbyError::AlreadyInRoom))]
        );
        assert!(mgr.room(&"2".into()).is_none());
    }

    struct Exhausted;

    impl RoomIdGenerator for Exhausted {
        fn next_id(&mut self) -> Option<RoomId> {
            None
        }
    }

    struct AlwaysOne;

    impl RoomIdGenerator for AlwaysOne {
        fn next_id(&mut self) -> Option<RoomId> {
            Some("1".into())
        }
    }

    #[tokio::test]
    async fn test_create_room_fails_when_ids_run_out() {
        let (_t, stop) = shutdown::channel();
        let mut mgr = RoomManager::with_id_generator(LobbyConfig::default(), Exhausted, stop);
        let mut a = Client::new(1);

        mgr.handle(a.inbound(create("A"))).await;
        assert_eq!(
            a.drain(),
            vec![Envelope::CreateRoomReply(Err(LobbyError::RoomCreationFailed))]
        );
        assert_eq!(mgr.player_room(&"A".into()), None);
    }

    #[tokio::test]
    async fn test_create_room_fails_on_id_collision() {
        let (_t, stop) = shutdown::channel();
        let mut mgr = RoomManager::with_id_generator(LobbyConfig::default(), AlwaysOne, stop);
        let mut a = Client::new(1);
        let mut b = Client::new(2);

        mgr.handle(a.inbound(create("A"))).await;
        mgr.handle(b.inbound(create("B"))).await;
        a.drain();
        assert_eq!(
            b.drain(),
            vec![Envelope::CreateRoomReply(Err(LobbyError::RoomCreationFailed))]
        );
        assert_eq!(mgr.room(&"1".into()).unwrap().info(), info("1", &["A"]));
    }

    // =====================================================================
    // EnterRoom
    // =====================================================================

    #[tokio::test]
    async fn test_enter_room_replies_roster_and_notifies_others() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        mgr.handle(a.inbound(create("A"))).await;
        a.drain();

        mgr.handle(b.inbound(enter("1", "B"))).await;

        assert_eq!(b.drain(), vec![Envelope::EnterRoomReply(Ok(info("1", &["A", "B"])))]);
        assert_eq!(a.drain(), vec![Envelope::RoomInfoChanged(info("1", &["A", "B"]))]);
    }

    #[tokio::test]
    async fn test_enter_unknown_room() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut b = Client::new(2);
        mgr.handle(b.inbound(enter("9", "B"))).await;
        assert_eq!(
            b.drain(),
            vec![Envelope::EnterRoomReply(Err(LobbyError::RoomNotFound))]
        );
    }

    #[tokio::test]
    async fn test_enter_same_room_twice() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        mgr.handle(a.inbound(create("A"))).await;
        a.drain();

        mgr.handle(a.inbound(enter("1", "A"))).await;
        assert_eq!(
            a.drain(),
            vec![Envelope::EnterRoomReply(Err(LobbyError::PlayerAlreadyInRoom))]
        );
    }

    #[tokio::test]
    async fn test_player_is_never_in_two_rooms() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        mgr.handle(a.inbound(create("A"))).await;
        mgr.handle(b.inbound(create("B"))).await;
        a.drain();
        b.drain();

        mgr.handle(a.inbound(enter("2", "A"))).await;
        assert_eq!(
            a.drain(),
            vec![Envelope::EnterRoomReply(Err(LobbyError::AlreadyInRoom))]
        );
        assert_eq!(mgr.room(&"2".into()).unwrap().info(), info("2", &["B"]));
        assert!(b.drain().is_empty());
    }

    // =====================================================================
    // ExitRoom
    // =====================================================================

    #[tokio::test]
    async fn test_exit_room_notifies_remaining_and_frees_player() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        room_with_two(&mut mgr, &mut a, &mut b).await;

        mgr.handle(b.inbound(exit("1", "B"))).await;

        assert_eq!(b.drain(), vec![Envelope::ExitRoomReply(Ok("1".into()))]);
        assert_eq!(a.drain(), vec![Envelope::RoomInfoChanged(info("1", &["A"]))]);
        assert_eq!(mgr.player_room(&"B".into()), None);

        // B is free to create its own room.
        mgr.handle(b.inbound(create("B"))).await;
        assert_eq!(b.drain(), vec![Envelope::CreateRoomReply(Ok(info("2", &["B"])))]);
    }

    #[tokio::test]
    async fn test_empty_room_is_kept() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        mgr.handle(a.inbound(create("A"))).await;
        mgr.handle(a.inbound(exit("1", "A"))).await;

        assert!(mgr.room(&"1".into()).unwrap().is_empty());
        let mut b = Client::new(2);
        mgr.handle(b.inbound(enter("1", "B"))).await;
        assert_eq!(b.drain(), vec![Envelope::EnterRoomReply(Ok(info("1", &["B"])))]);
    }

    #[tokio::test]
    async fn test_exit_errors() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        mgr.handle(a.inbound(create("A"))).await;
        a.drain();

        mgr.handle(a.inbound(exit("9", "A"))).await;
        mgr.handle(a.inbound(exit("1", "Z"))).await;
        assert_eq!(
            a.drain(),
            vec![
                Envelope::ExitRoomReply(Err(LobbyError::RoomNotFound)),
                Envelope::ExitRoomReply(Err(LobbyError::PlayerNotFound)),
            ]
        );
    }

    // =====================================================================
    // StartGame
    // =====================================================================

    #[tokio::test]
    async fn test_start_game_hands_every_member_to_the_game() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        room_with_two(&mut mgr, &mut a, &mut b).await;

        mgr.handle(b.inbound(start("1"))).await;

        let ok = Envelope::StartGameReply(Ok("1".into()));
        assert_eq!(a.drain(), vec![ok.clone()]);
        assert_eq!(b.drain(), vec![ok]);
        assert_eq!(a.session.owner().name(), "game-1");
        assert!(a.session.owner().same_inbox(&b.session.owner()));
        assert_eq!(mgr.room(&"1".into()).unwrap().status(), RoomStatus::InGame);
    }

    #[tokio::test]
    async fn test_in_game_room_is_closed() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        let mut c = Client::new(3);
        room_with_two(&mut mgr, &mut a, &mut b).await;
        mgr.handle(a.inbound(start("1"))).await;
        a.drain();
        b.drain();

        mgr.handle(c.inbound(enter("1", "C"))).await;
        mgr.handle(c.inbound(start("1"))).await;
        mgr.handle(c.inbound(exit("1", "A"))).await;
        assert_eq!(
            c.drain(),
            vec![
                Envelope::EnterRoomReply(Err(LobbyError::RoomAlreadyInGame)),
                Envelope::StartGameReply(Err(LobbyError::RoomAlreadyInGame)),
                Envelope::ExitRoomReply(Err(LobbyError::RoomAlreadyInGame)),
            ]
        );
        assert_eq!(mgr.room(&"1".into()).unwrap().info(), info("1", &["A", "B"]));
        assert!(a.drain().is_empty());
    }

    #[tokio::test]
    async fn test_start_errors_go_only_to_requester() {
        let (mut mgr, _t) = lobby(LobbyConfig {
            min_players_to_start: 2,
            ..LobbyConfig::default()
        });
        let mut a = Client::new(1);
        let mut b = Client::new(2);
        mgr.handle(a.inbound(create("A"))).await;
        a.drain();

        mgr.handle(b.inbound(start("9"))).await;
        mgr.handle(b.inbound(start("1"))).await;
        assert_eq!(
            b.drain(),
            vec![
                Envelope::StartGameReply(Err(LobbyError::RoomNotFound)),
                Envelope::StartGameReply(Err(LobbyError::NotEnoughPlayers {
                    required: 2,
                    present: 1,
                })),
            ]
        );
        assert!(a.drain().is_empty());
        assert_eq!(a.session.owner().name(), "lobby");
    }

    // =====================================================================
    // Other traffic
    // =====================================================================

    #[tokio::test]
    async fn test_heartbeat_and_stray_messages_get_no_reply() {
        let (mut mgr, _t) = lobby(LobbyConfig::default());
        let mut a = Client::new(1);
        mgr.handle(a.inbound(Envelope::Heartbeat(Heartbeat {
            player_id: "A".into(),
        })))
        .await;
        mgr.handle(a.inbound(Envelope::Input(framehub_protocol::Input {
            player_id: "A".into(),
            operations: vec![],
        })))
        .await;
        assert!(a.drain().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_lobby_with_custom_ids() {
        let (_trigger, stop) = shutdown::channel();
        let mailbox =
            RoomManager::with_id_generator(LobbyConfig::default(), AlwaysOne, stop).spawn();
        let mut a = Client::new(1);
        let mut b = Client::new(2);

        mailbox.deliver(a.inbound(create("A"))).await.unwrap();
        assert_eq!(
            a.outbound.recv().await,
            Some(Envelope::CreateRoomReply(Ok(info("1", &["A"]))))
        );

        mailbox.deliver(b.inbound(enter("1", "B"))).await.unwrap();
        assert_eq!(
            b.outbound.recv().await,
            Some(Envelope::EnterRoomReply(Ok(info("1", &["A", "B"]))))
        );
        assert_eq!(
            a.outbound.recv().await,
            Some(Envelope::RoomInfoChanged(info("1", &["A", "B"])))
        );
    }

    #[tokio::test]
    async fn test_spawned_lobby_stops_on_shutdown() {
        let (trigger, stop) = shutdown::channel();
        let mailbox = RoomManager::new(LobbyConfig::default(), stop).spawn();
        assert_eq!(mailbox.name(), "lobby");

        trigger.trigger();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(mailbox.is_closed());
    }
}

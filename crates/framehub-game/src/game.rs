//! The game actor: load barrier, input stamping, and per-tick frame sync.
//!
//! A game owns every message its players send from the moment the lobby
//! starts it. Inputs are stamped with the game's own frame counter on
//! arrival. On each tick every player receives the frames it hasn't seen
//! yet, for every player, so all clients apply the same inputs on the same
//! frame.

use std::collections::BTreeMap;

use framehub_protocol::{
    Envelope, FrameNumber, GameEnd, GameEndNotice, GameLoadComplete,
    GameLoadCompleteReply, Input, LoadedPlayer, PlayerFrames, PlayerId,
    RoomId, SyncFrames,
};
use framehub_session::{Inbound, Mailbox, SessionError, SessionHandle, Shutdown};
use framehub_tick::{TickMetrics, TickScheduler};
use tokio::sync::mpsc;

use crate::{GameConfig, GamePlayer, GameStatus};

/// A running match between the members of one room.
#[derive(Debug)]
pub struct Game {
    id: RoomId,
    status: GameStatus,
    players: BTreeMap<PlayerId, GamePlayer>,
    frame: FrameNumber,
    scheduler: TickScheduler,
    inbox_capacity: usize,
}

impl Game {
    /// Creates a game in the `Loading` state. The id is the id of the room
    /// it was started from.
    pub fn new(
        id: RoomId,
        players: impl IntoIterator<Item = (PlayerId, SessionHandle)>,
        config: GameConfig,
    ) -> Self {
        let players = players
            .into_iter()
            .map(|(player_id, session)| {
                (player_id.clone(), GamePlayer::new(player_id, session))
            })
            .collect();
        Self {
            id,
            status: GameStatus::Loading,
            players,
            frame: 0,
            scheduler: TickScheduler::new(config.tick),
            inbox_capacity: config.inbox_capacity,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The frame inputs are currently stamped with.
    pub fn frame(&self) -> FrameNumber {
        self.frame
    }

    pub fn player(&self, id: &PlayerId) -> Option<&GamePlayer> {
        self.players.get(id)
    }

    pub fn tick_metrics(&self) -> &TickMetrics {
        self.scheduler.metrics()
    }

    /// Moves the game onto its own task and returns its mailbox.
    pub fn spawn(self, shutdown: Shutdown) -> Mailbox {
        let (mailbox, inbox) =
            Mailbox::channel(format!("game-{}", self.id), self.inbox_capacity);
        tokio::spawn(self.run(inbox, shutdown));
        mailbox
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<Inbound>, mut shutdown: Shutdown) {
        tracing::info!(room_id = %self.id, players = self.players.len(), "game started");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!(room_id = %self.id, "game stopping for shutdown");
                    break;
                }
                msg = inbox.recv() => {
                    let Some(inbound) = msg else { break };
                    self.handle(inbound).await;
                }
                info = self.scheduler.wait_for_tick() => {
                    if info.overrun {
                        tracing::debug!(
                            room_id = %self.id,
                            tick = info.tick,
                            frame = self.frame,
                            skipped = info.ticks_skipped,
                            "late tick"
                        );
                    }
                    self.tick();
                    self.scheduler.record_tick_end();
                }
            }
            if self.status == GameStatus::Ended {
                // Buffered messages are still drained (and rejected) before
                // recv yields None.
                inbox.close();
            }
        }
        let metrics = self.scheduler.metrics();
        tracing::info!(
            room_id = %self.id,
            frame = self.frame,
            ticks = self.scheduler.tick_count(),
            overruns = metrics.total_overruns,
            skipped = metrics.total_skipped,
            max_tick_ms = metrics.max_tick_time.as_secs_f64() * 1000.0,
            "game stopped"
        );
    }

    /// Processes one inbound message.
    pub async fn handle(&mut self, inbound: Inbound) {
        let Inbound { session, envelope } = inbound;
        match (self.status, envelope) {
            (GameStatus::Ended, envelope) => {
                tracing::error!(
                    room_id = %self.id,
                    conn_id = %session.id(),
                    kind = envelope.kind(),
                    "message for ended game"
                );
            }
            (_, Envelope::Heartbeat(_)) => {
                tracing::trace!(room_id = %self.id, conn_id = %session.id(), "heartbeat");
            }
            (GameStatus::Loading, Envelope::GameLoadComplete(msg)) => {
                self.on_load_complete(msg).await;
            }
            (GameStatus::Playing, Envelope::GameLoadComplete(msg)) => {
                tracing::warn!(
                    room_id = %self.id,
                    player_id = %msg.player_id,
                    "load complete after game start, ignoring"
                );
            }
            (GameStatus::Playing, Envelope::Input(msg)) => self.on_input(msg),
            (_, Envelope::GameEnd(msg)) => self.on_game_end(msg),
            (status, envelope) => {
                tracing::warn!(
                    room_id = %self.id,
                    conn_id = %session.id(),
                    %status,
                    kind = envelope.kind(),
                    "unexpected message for game state"
                );
            }
        }
    }

    async fn on_load_complete(&mut self, msg: GameLoadComplete) {
        let Some(player) = self.players.get_mut(&msg.player_id) else {
            tracing::warn!(room_id = %self.id, player_id = %msg.player_id, "load complete from unknown player");
            return;
        };
        player.ready = true;
        player.load_payload = msg.payload;
        tracing::debug!(room_id = %self.id, player_id = %msg.player_id, "player loaded");

        if !self.players.values().all(|p| p.ready) {
            return;
        }

        let reply = Envelope::GameLoadCompleteReply(GameLoadCompleteReply {
            players: self
                .players
                .values()
                .map(|p| LoadedPlayer {
                    player_id: p.id.clone(),
                    payload: p.load_payload.clone(),
                })
                .collect(),
        });
        for player in self.players.values() {
            if let Err(e) = player.session.send(reply.clone()).await {
                tracing::warn!(room_id = %self.id, player_id = %player.id, error = %e, "load reply not delivered");
            }
        }

        self.set_status(GameStatus::Playing);
        self.frame = 0;
        self.scheduler.start();
        tracing::info!(
            room_id = %self.id,
            rate_hz = self.scheduler.tick_rate_hz(),
            "all players loaded, game playing"
        );
    }

    fn on_input(&mut self, msg: Input) {
        let frame = self.frame;
        let Some(player) = self.players.get_mut(&msg.player_id) else {
            tracing::warn!(room_id = %self.id, player_id = %msg.player_id, "input from unknown player");
            return;
        };
        tracing::trace!(
            room_id = %self.id,
            player_id = %msg.player_id,
            frame,
            operations = msg.operations.len(),
            "input"
        );
        player.record(frame, msg.operations);
    }

    /// Every player hears about a game end, even one from an id that isn't
    /// in the game, and a forced end always ends the game.
    fn on_game_end(&mut self, msg: GameEnd) {
        let notice = Envelope::GameEndNotice(GameEndNotice {
            player_id: msg.player_id.clone(),
            force: msg.force,
            payload: msg.payload,
        });
        for p in self.players.values() {
            if let Err(e) = p.session.try_send(notice.clone()) {
                tracing::warn!(room_id = %self.id, player_id = %p.id, error = %e, "game end notice dropped");
            }
        }

        if msg.force {
            tracing::info!(room_id = %self.id, player_id = %msg.player_id, "game force-ended");
            self.end();
            return;
        }

        match self.players.get_mut(&msg.player_id) {
            Some(player) => player.ended = true,
            None => {
                tracing::warn!(room_id = %self.id, player_id = %msg.player_id, "game end from unknown player");
                return;
            }
        }
        if self.players.values().all(|p| p.ended) {
            tracing::info!(room_id = %self.id, "every player ended");
            self.end();
        } else {
            tracing::debug!(room_id = %self.id, player_id = %msg.player_id, "player ended");
        }
    }

    fn end(&mut self) {
        self.set_status(GameStatus::Ended);
        self.scheduler.stop();
    }

    /// Moves to `next` if the transition is legal; otherwise logs and stays.
    fn set_status(&mut self, next: GameStatus) {
        if !self.status.can_transition_to(next) {
            tracing::error!(room_id = %self.id, from = %self.status, to = %next, "illegal game transition");
            return;
        }
        self.status = next;
    }

    /// Advances the game by one frame.
    ///
    /// Every connected player is sent the frames from its cursor up to the
    /// current frame. A player whose queue is full keeps its cursor and gets
    /// the whole backlog on a later tick. A player whose session has closed
    /// is no longer synced and no longer holds frames back. The frame
    /// counter advances regardless.
    pub fn tick(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        let frame = self.frame;

        let outcomes: Vec<SyncOutcome> = self
            .players
            .values()
            .map(|receiver| self.sync(receiver, frame))
            .collect();
        for (player, outcome) in self.players.values_mut().zip(outcomes) {
            match outcome {
                SyncOutcome::Sent => player.cursor = Some(frame),
                SyncOutcome::Departed => {
                    player.departed = true;
                    tracing::info!(
                        room_id = %self.id,
                        player_id = %player.id,
                        cursor = ?player.cursor,
                        "player disconnected, no longer synced"
                    );
                }
                SyncOutcome::Skipped | SyncOutcome::Deferred => {}
            }
        }

        self.frame = self.frame.saturating_add(1);

        let keep_from = self
            .players
            .values()
            .filter(|p| !p.departed)
            .map(GamePlayer::next_frame)
            .min()
            .unwrap_or(self.frame);
        for player in self.players.values_mut() {
            player.prune(keep_from);
        }

        if self.players.values().all(|p| p.departed) {
            tracing::info!(room_id = %self.id, frame = self.frame, "every player disconnected");
            self.end();
        }
    }

    /// Sends `receiver` everything from its cursor up to `frame`.
    fn sync(&self, receiver: &GamePlayer, frame: FrameNumber) -> SyncOutcome {
        if receiver.departed {
            return SyncOutcome::Skipped;
        }
        if receiver.session.is_closed() {
            return SyncOutcome::Departed;
        }
        let start = receiver.next_frame();
        if start > frame {
            return SyncOutcome::Skipped;
        }
        let batch = Envelope::SyncFrames(SyncFrames {
            players: self
                .players
                .values()
                .map(|p| PlayerFrames {
                    player_id: p.id.clone(),
                    frames: p.frames(start, frame),
                })
                .collect(),
        });
        match receiver.session.try_send(batch) {
            Ok(()) => {
                tracing::trace!(room_id = %self.id, player_id = %receiver.id, start, frame, "frames synced");
                SyncOutcome::Sent
            }
            Err(SessionError::Closed(_)) => SyncOutcome::Departed,
            Err(e) => {
                tracing::warn!(
                    room_id = %self.id,
                    player_id = %receiver.id,
                    pending_from = start,
                    frame,
                    error = %e,
                    "frame sync deferred"
                );
                SyncOutcome::Deferred
            }
        }
    }
}

/// What one tick did for one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Sent,
    /// Queue full; the cursor stays and the backlog goes out later.
    Deferred,
    Departed,
    /// Nothing new, or the receiver is already gone.
    Skipped,
}

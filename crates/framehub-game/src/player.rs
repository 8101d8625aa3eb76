//! Per-player state inside a game.

use std::collections::BTreeMap;

use framehub_protocol::{Frame, FrameNumber, Operation, PlayerId};
use framehub_session::SessionHandle;

/// One participant of a game.
#[derive(Debug)]
pub struct GamePlayer {
    pub(crate) id: PlayerId,
    pub(crate) session: SessionHandle,
    pub(crate) ready: bool,
    pub(crate) ended: bool,
    /// Set once the player's session is found closed. Never cleared.
    pub(crate) departed: bool,
    /// Operations by the frame they arrived in, in arrival order.
    pub(crate) inputs: BTreeMap<FrameNumber, Vec<Operation>>,
    /// Last frame included in a sync this player received.
    pub(crate) cursor: Option<FrameNumber>,
    pub(crate) load_payload: Vec<u8>,
}

impl GamePlayer {
    pub(crate) fn new(id: PlayerId, session: SessionHandle) -> Self {
        Self {
            id,
            session,
            ready: false,
            ended: false,
            departed: false,
            inputs: BTreeMap::new(),
            cursor: None,
            load_payload: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Returns `true` once the player's connection has gone away.
    pub fn has_departed(&self) -> bool {
        self.departed
    }

    pub fn cursor(&self) -> Option<FrameNumber> {
        self.cursor
    }

    /// First frame this player has not been sent yet.
    pub fn next_frame(&self) -> FrameNumber {
        self.cursor.map_or(0, |f| f.saturating_add(1))
    }

    /// Operations recorded for `frame`, if any are still buffered.
    pub fn operations_at(&self, frame: FrameNumber) -> Option<&[Operation]> {
        self.inputs.get(&frame).map(Vec::as_slice)
    }

    pub(crate) fn record(&mut self, frame: FrameNumber, operations: Vec<Operation>) {
        self.inputs.entry(frame).or_default().extend(operations);
    }

    /// Every frame in `start..=end`, empty where nothing was recorded.
    pub(crate) fn frames(&self, start: FrameNumber, end: FrameNumber) -> Vec<Frame> {
        (start..=end)
            .map(|number| Frame {
                number,
                operations: self.inputs.get(&number).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Drops buffered frames before `keep_from`.
    pub(crate) fn prune(&mut self, keep_from: FrameNumber) {
        self.inputs = self.inputs.split_off(&keep_from);
    }
}

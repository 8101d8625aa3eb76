//! Room id allocation.

use framehub_protocol::RoomId;

/// Hands out ids for new rooms.
///
/// The lobby owns its generator, so `next_id` takes `&mut self` and needs
/// no locking. The lobby's task holds `&self` across awaits, hence `Sync`.
pub trait RoomIdGenerator: Send + Sync + 'static {
    /// Returns the next id, or `None` once the generator is exhausted.
    fn next_id(&mut self) -> Option<RoomId>;
}

/// Decimal ids counting up from `"1"`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Starts counting at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl RoomIdGenerator for SequentialIds {
    fn next_id(&mut self) -> Option<RoomId> {
        let id = self.next;
        self.next = self.next.checked_add(1)?;
        Some(RoomId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_count_from_one() {
        let mut ids = SequentialIds::default();
        assert_eq!(ids.next_id(), Some(RoomId::from("1")));
        assert_eq!(ids.next_id(), Some(RoomId::from("2")));
    }

    #[test]
    fn test_sequential_ids_exhaust_at_max() {
        let mut ids = SequentialIds::starting_at(u64::MAX);
        assert_eq!(ids.next_id(), None);
    }
}

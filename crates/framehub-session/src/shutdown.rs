//! Cooperative shutdown signal shared by the server, sessions, and actors.

use tokio::sync::watch;

/// Fires the shutdown signal. Dropping the trigger also counts as firing.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// A listener for the shutdown signal. Clone one per task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Creates a linked trigger/listener pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new listener for this trigger.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

impl Shutdown {
    /// Completes once shutdown has been requested.
    pub async fn cancelled(&mut self) {
        // An Err means the trigger was dropped, which also ends the wait.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_every_listener() {
        let (trigger, mut first) = channel();
        let mut second = trigger.subscribe();
        assert!(!first.is_cancelled());

        trigger.trigger();
        first.cancelled().await;
        second.cancelled().await;
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_cancelled() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);
        shutdown.cancelled().await;
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_pends_without_trigger() {
        let (_trigger, mut shutdown) = channel();
        let waited =
            tokio::time::timeout(Duration::from_secs(60), shutdown.cancelled()).await;
        assert!(waited.is_err());
    }
}

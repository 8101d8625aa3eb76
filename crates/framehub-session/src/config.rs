//! Session configuration.

use std::time::Duration;

/// Per-connection limits, supplied when the session is created.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the outbound queue. Lobby replies wait for a free slot;
    /// frame sync drops the tick's update when it's full.
    pub outbound_capacity: usize,

    /// How long the inbound loop waits for the next message before giving
    /// up on the client. Clients send heartbeats to stay under it.
    pub read_timeout: Duration,

    /// How long one transport write may take.
    pub write_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 1024,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

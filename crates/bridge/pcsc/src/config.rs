//! Driver settings

use std::time::Duration;

use pcsc::{Protocols, ShareMode};

/// Settings for the monitor thread and the UID connections it opens
#[derive(Debug, Clone, Copy)]
pub struct PcscConfig {
    /// Share mode of the short-lived UID connection; shared lets other
    /// applications keep using the reader
    pub share_mode: ShareMode,

    /// Protocols offered when connecting to a card
    pub protocols: Protocols,

    /// Upper bound on one status wait; also the reader list refresh period
    pub poll_interval: Duration,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            protocols: Protocols::ANY,
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl PcscConfig {
    /// Defaults: shared access, any protocol, 250 ms poll
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another poll interval
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

//! Configuration options for the bridge core

use std::time::Duration;

/// Reader name fragment accepted when no allow-list is configured
pub const DEFAULT_READER_FILTER: &str = "ACR122";

/// How long a wait request stays pending before it times out
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration options for the bridge core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Substrings of reader names the bridge will bind; empty accepts any reader
    pub allowed_readers: Vec<String>,

    /// Deadline applied to each wait request
    pub wait_timeout: Duration,

    /// Initial state of the bridge flag
    pub start_enabled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allowed_readers: vec![DEFAULT_READER_FILTER.to_string()],
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            start_enabled: true,
        }
    }
}

impl BridgeConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reader name allow-list
    pub fn with_allowed_readers<I, S>(mut self, readers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_readers = readers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the wait deadline
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the initial bridge flag
    pub const fn with_start_enabled(mut self, enabled: bool) -> Self {
        self.start_enabled = enabled;
        self
    }

    /// Whether a reader with this name may be bound
    pub fn accepts_reader(&self, name: &str) -> bool {
        self.allowed_readers.is_empty()
            || self
                .allowed_readers
                .iter()
                .any(|fragment| name.contains(fragment.as_str()))
    }
}

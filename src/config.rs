use embassy_time::Duration;

/// Tunables of the command client.
///
/// The defaults match a 9602/9603 on a 19200 baud serial line. Session
/// level knobs (signal threshold, network wait bound) live in
/// [`SessionOptions`](crate::SessionOptions).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) cmd_cooldown: Duration,
    pub(crate) tx_timeout: Duration,
    pub(crate) flush_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cmd_cooldown: Duration::from_millis(20),
            tx_timeout: Duration::from_millis(1000),
            flush_timeout: Duration::from_millis(1000),
        }
    }

    /// Quiet period enforced between two consecutive commands.
    #[must_use]
    pub const fn with_cmd_cooldown(mut self, duration: Duration) -> Self {
        self.cmd_cooldown = duration;
        self
    }

    #[must_use]
    pub const fn with_tx_timeout(mut self, duration: Duration) -> Self {
        self.tx_timeout = duration;
        self
    }

    #[must_use]
    pub const fn with_flush_timeout(mut self, duration: Duration) -> Self {
        self.flush_timeout = duration;
        self
    }
}

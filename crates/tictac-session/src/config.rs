//! Session configuration.

use std::time::Duration;

/// How long a finished round stays on screen before the board clears.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(5);

/// Settings for one session actor.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between a win or draw and the automatic round reset.
    pub reset_delay: Duration,

    /// Capacity of the session's command mailbox. Callers wait (bounded
    /// backpressure) when it is full.
    pub mailbox_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_delay: DEFAULT_RESET_DELAY,
            mailbox_size: 64,
        }
    }
}

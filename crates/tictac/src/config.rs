//! Server configuration parsed from environment variables.

use std::time::Duration;

use tictac_session::{DEFAULT_RESET_DELAY, SessionConfig};

/// Settings for a Tictac server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Delay between a finished round and the board reset.
    pub reset_delay: Duration,
    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// - `TICTAC_BIND` — listen address (`0.0.0.0:8080`)
    /// - `TICTAC_RESET_DELAY_MS` — round reset delay (`5000`)
    /// - `TICTAC_IDLE_TIMEOUT_SECS` — idle connection timeout (`300`)
    ///
    /// Values that fail to parse fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        ServerConfig {
            bind_addr: lookup("TICTAC_BIND").unwrap_or(defaults.bind_addr),
            reset_delay: lookup("TICTAC_RESET_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reset_delay),
            idle_timeout: lookup("TICTAC_IDLE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
        }
    }

    /// The session settings this server config implies.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reset_delay: self.reset_delay,
            ..SessionConfig::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
            reset_delay: DEFAULT_RESET_DELAY,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

//! # Tictac
//!
//! A server-authoritative, two-player tic-tac-toe match over WebSockets.
//!
//! The first two connections are seated as `X` and `O`; a third is refused.
//! Players send `{"type":"make_turn","x":row,"y":col}` and every accepted
//! change is pushed to both players as a full state snapshot. A won or
//! drawn round clears itself after a short delay.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tictac::prelude::*;
//!
//! # async fn run() -> Result<(), TictacError> {
//! tictac::init_tracing();
//! let config = ServerConfig::from_env();
//! let server = TictacServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::TictacError;
pub use server::{TictacServer, TictacServerBuilder};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that honours `RUST_LOG`, defaulting to
/// `info`. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything needed to run or embed a server.
pub mod prelude {
    pub use crate::{ServerConfig, TictacError, TictacServer, TictacServerBuilder};
    pub use tictac_protocol::{ClientMessage, Codec, JsonCodec, Player};
    pub use tictac_session::{GameState, RoundStatus, SessionConfig, SessionHandle};
}

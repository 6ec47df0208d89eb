//! Runs a single tic-tac-toe match server.
//!
//! Configuration comes from the environment (`TICTAC_BIND`,
//! `TICTAC_RESET_DELAY_MS`, `TICTAC_IDLE_TIMEOUT_SECS`); logging honours
//! `RUST_LOG`.

use tictac::prelude::*;

#[tokio::main]
async fn main() -> Result<(), TictacError> {
    tictac::init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.bind_addr,
        reset_delay_ms = config.reset_delay.as_millis() as u64,
        "starting tic-tac-toe server"
    );

    let server = TictacServerBuilder::from_config(&config).build().await?;
    server.run().await
}

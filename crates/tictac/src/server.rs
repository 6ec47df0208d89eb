//! `TictacServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session. One server
//! hosts one match.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tictac_protocol::{Codec, JsonCodec};
use tictac_session::{SessionConfig, SessionHandle, spawn_session};
use tictac_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ServerConfig, TictacError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: SessionHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Tictac server.
///
/// # Example
///
/// ```rust,no_run
/// use tictac::prelude::*;
///
/// # async fn run() -> Result<(), TictacError> {
/// let server = TictacServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TictacServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    idle_timeout: Duration,
}

impl TictacServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: defaults.session_config(),
            idle_timeout: defaults.idle_timeout,
        }
    }

    /// Creates a builder from a loaded [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr.clone(),
            session_config: config.session_config(),
            idle_timeout: config.idle_timeout,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and starts the session, encoding with JSON.
    pub async fn build(self) -> Result<TictacServer<JsonCodec>, TictacError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener and starts the session with a custom codec.
    pub async fn build_with_codec<C: Codec + Clone>(
        self,
        codec: C,
    ) -> Result<TictacServer<C>, TictacError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let session = spawn_session(self.session_config, codec.clone());

        let state = Arc::new(ServerState {
            session,
            codec,
            idle_timeout: self.idle_timeout,
        });

        Ok(TictacServer { transport, state })
    }
}

impl Default for TictacServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tictac game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TictacServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TictacServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TictacServerBuilder {
        TictacServerBuilder::new()
    }
}

impl<C: Codec> TictacServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TictacError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns a handle to the match this server hosts.
    pub fn session(&self) -> SessionHandle {
        self.state.session.clone()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// The WebSocket handshake happens inside that task, so a peer that
    /// never upgrades cannot hold up the loop. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), TictacError> {
        tracing::info!("Tictac server running");

        loop {
            match self.transport.accept().await {
                Ok(incoming) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(incoming, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

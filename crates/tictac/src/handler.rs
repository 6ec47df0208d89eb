//! Per-connection handler: seat assignment, snapshot forwarding and move
//! routing.
//!
//! Each accepted connection gets its own Tokio task running this handler:
//!   0. Complete the WebSocket handshake (bounded by a timeout)
//!   1. Ask the session for a seat; refuse the connection if both are taken
//!   2. Spawn a writer that forwards every snapshot to the socket
//!   3. Loop: receive frames → decode `ClientMessage` → submit the move

use std::sync::Arc;

use tictac_protocol::{ClientMessage, Codec, Player};
use tictac_session::{Frame, SessionError, SessionHandle};
use tictac_transport::{
    Connection, Handshake, PendingWebSocket, WebSocketConnection,
};
use tokio::sync::mpsc;

use crate::TictacError;
use crate::server::ServerState;

/// Drop guard that frees the player's seat when the handler exits.
///
/// Runs even if the handler returns early through `?`. `Drop` is
/// synchronous, so the disconnect is spawned.
struct PlayerGuard {
    player: Player,
    session: SessionHandle,
}

impl Drop for PlayerGuard {
    fn drop(&mut self) {
        let player = self.player;
        let session = self.session.clone();
        tokio::spawn(async move {
            let _ = session.disconnect(player).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    incoming: PendingWebSocket,
    state: Arc<ServerState<C>>,
) -> Result<(), TictacError> {
    let conn_id = incoming.id();
    let peer = incoming.peer_addr();
    let conn = Arc::new(incoming.upgrade().await?);
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    let player = match state.session.connect(tx).await {
        Ok(player) => player,
        Err(SessionError::Full) => {
            tracing::info!(%conn_id, "refusing connection, match is full");
            conn.close(Some(SessionError::Full.to_string().as_str())).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let _guard = PlayerGuard {
        player,
        session: state.session.clone(),
    };
    tracing::info!(%conn_id, %player, "player seated");

    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = conn.send(&frame).await {
                    tracing::debug!(%player, error = %e, "snapshot send failed");
                    break;
                }
            }
        })
    };

    let result = read_loop(&conn, &state, player).await;
    writer.abort();

    // _guard drops here → seat is released.
    result
}

/// Reads frames until the peer leaves, errors, or goes idle.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    player: Player,
) -> Result<(), TictacError> {
    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%player, error = %e, "recv error");
                return Ok(());
            }
            Err(_) => {
                tracing::info!(%player, "connection timed out");
                return Ok(());
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player, error = %e, "ignoring undecodable message");
                continue;
            }
        };

        match msg {
            ClientMessage::MakeTurn { x, y } => {
                state.session.submit_move(player, x, y).await?;
            }
        }
    }
}

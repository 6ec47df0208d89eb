//! Session actor: an isolated Tokio task that owns one match.
//!
//! The actor processes its mailbox strictly in order, so every operation
//! sees the state left by the previous one. Callers only ever hold a
//! [`SessionHandle`].

use std::collections::HashMap;
use std::sync::Arc;

use tictac_protocol::{Codec, Player};
use tokio::sync::{mpsc, oneshot};

use crate::timer::ResetTimer;
use crate::{GameState, RoundStatus, SessionConfig, SessionError};

/// One encoded snapshot, shared by every player it is sent to.
pub type Frame = Arc<[u8]>;

/// Outbound channel for delivering snapshots to one player.
///
/// Unbounded so a slow reader never stalls the actor; the connection task
/// on the other end owns the actual socket write.
pub type PlayerSender = mpsc::UnboundedSender<Frame>;

/// Commands sent to a session actor through its mailbox.
pub(crate) enum SessionCommand {
    /// Attach a player channel to the first free seat.
    Connect {
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Player, SessionError>>,
    },

    /// Detach a player.
    Disconnect {
        player: Player,
        reply: oneshot::Sender<()>,
    },

    /// Place a mark. Rejected moves are dropped silently.
    SubmitMove {
        player: Player,
        row: usize,
        col: usize,
    },

    /// Posted by the reset timer when its delay elapses.
    Reset { generation: u64 },

    /// Request the current snapshot.
    GetState { reply: oneshot::Sender<GameState> },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running session actor.
///
/// Cheap to clone; every connection task holds one.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Attaches a player's outbound channel and returns the seat assigned
    /// to it. Every attached player, the new one included, receives the
    /// updated snapshot.
    ///
    /// # Errors
    /// [`SessionError::Full`] if both seats are taken.
    pub async fn connect(&self, sender: PlayerSender) -> Result<Player, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Connect {
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)?
    }

    /// Detaches a player. Does nothing if the player is not connected.
    pub async fn disconnect(&self, player: Player) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Disconnect {
                player,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Submits a move (fire-and-forget).
    ///
    /// An out-of-turn, occupied-cell, off-board or after-the-round move
    /// changes nothing and broadcasts nothing; no error is returned for it.
    pub async fn submit_move(
        &self,
        player: Player,
        row: usize,
        col: usize,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::SubmitMove { player, row, col })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Returns the current snapshot. Because the mailbox is ordered, the
    /// result reflects every command this handle sent before.
    pub async fn snapshot(&self) -> Result<GameState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetState { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Tells the session to shut down. A pending reset is cancelled.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct SessionActor<C: Codec> {
    state: GameState,
    /// Per-player outbound channels.
    channels: HashMap<Player, PlayerSender>,
    reset: ResetTimer,
    config: SessionConfig,
    codec: C,
    receiver: mpsc::Receiver<SessionCommand>,
    /// Weak so the actor's own timer never keeps its mailbox open.
    mailbox: mpsc::WeakSender<SessionCommand>,
}

impl<C: Codec> SessionActor<C> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!("session started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Connect { sender, reply } => {
                    let result = self.handle_connect(sender);
                    let _ = reply.send(result);
                }
                SessionCommand::Disconnect { player, reply } => {
                    self.handle_disconnect(player);
                    let _ = reply.send(());
                }
                SessionCommand::SubmitMove { player, row, col } => {
                    self.handle_move(player, row, col);
                }
                SessionCommand::Reset { generation } => {
                    self.handle_reset(generation);
                }
                SessionCommand::GetState { reply } => {
                    let _ = reply.send(self.state.clone());
                }
                SessionCommand::Shutdown => {
                    tracing::info!("session shutting down");
                    break;
                }
            }
        }

        tracing::info!("session stopped");
    }

    fn handle_connect(&mut self, sender: PlayerSender) -> Result<Player, SessionError> {
        // Read and commit happen inside one command, so no other connect
        // can claim the seat in between.
        let Some(player) = self.state.first_free_slot() else {
            tracing::info!("connection rejected, both seats taken");
            return Err(SessionError::Full);
        };

        self.channels.insert(player, sender);
        self.commit(self.state.with_player(player));

        tracing::info!(
            %player,
            players = self.state.connected_players.len(),
            reset_pending = self.reset.is_armed(),
            "player connected"
        );
        Ok(player)
    }

    fn handle_disconnect(&mut self, player: Player) {
        self.channels.remove(&player);
        if !self.state.connected_players.contains(&player) {
            return;
        }

        self.commit(self.state.without_player(player));
        tracing::info!(
            %player,
            players = self.state.connected_players.len(),
            reset_pending = self.reset.is_armed(),
            "player disconnected"
        );
    }

    fn handle_move(&mut self, player: Player, row: usize, col: usize) {
        let next = match self.state.with_move(player, row, col) {
            Ok(next) => next,
            Err(reason) => {
                tracing::debug!(%player, row, col, %reason, "move rejected");
                return;
            }
        };

        let status = next.status();
        self.commit(next);

        match status {
            RoundStatus::Won(winner) => {
                tracing::info!(%winner, "round won");
                self.arm_reset();
            }
            RoundStatus::Drawn => {
                tracing::info!("round drawn");
                self.arm_reset();
            }
            RoundStatus::Ongoing => {}
        }
    }

    fn handle_reset(&mut self, generation: u64) {
        if !self.reset.fire(generation) {
            tracing::trace!(generation, "ignoring cancelled reset");
            return;
        }
        self.commit(self.state.next_round());
        tracing::info!("round reset");
    }

    fn arm_reset(&mut self) {
        self.reset.arm(self.config.reset_delay, self.mailbox.clone());
    }

    /// Replaces the state and broadcasts the new snapshot. Every accepted
    /// change goes through here exactly once.
    fn commit(&mut self, next: GameState) {
        self.state = next;
        self.broadcast();
    }

    /// Encodes the current snapshot once and hands it to every bound
    /// channel. A closed channel is skipped; it will be unbound when its
    /// connection task disconnects.
    fn broadcast(&self) {
        let frame: Frame = match self.codec.encode(&self.state) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode snapshot");
                return;
            }
        };

        for (player, sender) in &self.channels {
            if sender.send(Arc::clone(&frame)).is_err() {
                tracing::debug!(%player, "outbound channel closed, skipping");
            } else {
                tracing::trace!(%player, bytes = frame.len(), "snapshot queued");
            }
        }
    }
}

/// Spawns a new session actor and returns a handle to it.
///
/// Must be called from within a Tokio runtime. The actor stops when
/// [`SessionHandle::shutdown`] is called or every handle is dropped.
pub fn spawn_session<C: Codec>(config: SessionConfig, codec: C) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_size.max(1));

    let actor = SessionActor {
        state: GameState::new(),
        channels: HashMap::new(),
        reset: ResetTimer::new(),
        config,
        codec,
        receiver: rx,
        mailbox: tx.downgrade(),
    };

    tokio::spawn(actor.run());

    SessionHandle { sender: tx }
}

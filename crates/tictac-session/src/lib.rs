//! The authoritative session for one tic-tac-toe match.
//!
//! A session runs as a single Tokio task (actor model) that owns the
//! [`GameState`], the outbound channel of each connected player, and the
//! delayed round reset. Everything that changes the game, including the
//! reset timer firing, arrives as a command in the actor's mailbox and is
//! applied one at a time. Each committed change is encoded once and pushed
//! to every attached player.
//!
//! # Key types
//!
//! - [`spawn_session`] — starts an actor and returns its [`SessionHandle`]
//! - [`SessionHandle`] — connect, disconnect, submit moves, read snapshots
//! - [`GameState`] — the snapshot players receive
//! - [`SessionConfig`] — reset delay and mailbox size

mod config;
mod error;
mod game;
mod session;
mod timer;

pub use config::{DEFAULT_RESET_DELAY, SessionConfig};
pub use error::SessionError;
pub use game::{
    BOARD_SIZE, Field, GameState, MoveRejection, RoundStatus, is_full,
    winning_player,
};
pub use session::{Frame, PlayerSender, SessionHandle, spawn_session};

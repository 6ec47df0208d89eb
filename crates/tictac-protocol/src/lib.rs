//! Wire protocol for Tictac.
//!
//! This crate defines what players and the server exchange:
//!
//! - **Types** ([`Player`], [`ClientMessage`]) — the structures that travel
//!   on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how values become bytes
//!   and back. The session encodes every state snapshot through a codec,
//!   so swapping formats never touches game code.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Player};

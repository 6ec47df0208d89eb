//! Unified error type for the Tictac server.

use tictac_protocol::ProtocolError;
use tictac_session::SessionError;
use tictac_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` lift sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TictacError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (seats full, session gone).
    #[error(transparent)]
    Session(#[from] SessionError),
}

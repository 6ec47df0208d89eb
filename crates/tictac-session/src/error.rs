//! Error types for the session layer.

/// Errors returned by [`SessionHandle`](crate::SessionHandle) operations.
///
/// Invalid moves are deliberately absent: they are dropped by the session
/// without a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Both player slots are taken; the connection was not attached.
    #[error("2 players already connected")]
    Full,

    /// The session actor has shut down or its mailbox is closed.
    #[error("session is unavailable")]
    Unavailable,
}

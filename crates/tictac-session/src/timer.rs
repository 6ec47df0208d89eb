//! The delayed round reset.
//!
//! The timer never touches game state. When it elapses it posts a
//! [`SessionCommand::Reset`] into the session's own mailbox, so the reset
//! is serialized with every other update. Each arming gets a new
//! generation number; a reset whose generation is no longer current is
//! ignored, which covers the window where an old timer already queued its
//! command before being aborted.

use std::time::Duration;

use tokio::sync::mpsc::WeakSender;
use tokio::task::JoinHandle;

use crate::session::SessionCommand;

/// Single-shot, re-armable reset timer owned by a session actor.
pub(crate) struct ResetTimer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl ResetTimer {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }

    /// Starts a new countdown, cancelling any pending one.
    ///
    /// Holds only a weak sender so a pending reset never keeps a session
    /// alive after its last handle is gone.
    pub(crate) fn arm(
        &mut self,
        delay: Duration,
        mailbox: WeakSender<SessionCommand>,
    ) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(SessionCommand::Reset { generation }).await;
            }
        }));

        tracing::debug!(generation, ?delay, "round reset armed");
        generation
    }

    /// Consumes a fired reset. Returns `true` only for the currently armed
    /// generation; anything else is a leftover from a cancelled arming.
    pub(crate) fn fire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }

    /// Whether a reset is currently pending.
    pub(crate) fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

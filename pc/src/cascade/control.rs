//! Cooperative control protocol
//!
//! Pause and cancel are latched flags observed only at suspension points
//! between node steps; an in-flight generation call always settles before
//! either takes effect. Control commands may come from a different task than
//! the run loop, so the flags are atomics and the paused loop parks on a
//! Notify until resume or cancel.

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::debug;

/// Latched control flags shared between the control surface and the run loop
#[derive(Debug, Default)]
pub(crate) struct ControlFlags {
    pause: AtomicBool,
    cancel: AtomicBool,
    wakeup: Notify,
}

impl ControlFlags {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Clear both latches before a fresh run
    pub(crate) fn reset(&self) {
        debug!("ControlFlags::reset: called");
        self.pause.store(false, Ordering::SeqCst);
        self.cancel.store(false, Ordering::SeqCst);
    }

    /// Latch a pause request; returns true if newly latched
    pub(crate) fn request_pause(&self) -> bool {
        let newly = !self.pause.swap(true, Ordering::SeqCst);
        debug!(newly, "ControlFlags::request_pause: called");
        newly
    }

    /// Clear the pause latch and wake the loop; returns true if it was set
    pub(crate) fn clear_pause(&self) -> bool {
        let was_paused = self.pause.swap(false, Ordering::SeqCst);
        debug!(was_paused, "ControlFlags::clear_pause: called");
        if was_paused {
            self.wakeup.notify_waiters();
        }
        was_paused
    }

    /// Latch a cancel request; also wakes a paused loop so it can exit
    pub(crate) fn request_cancel(&self) -> bool {
        let newly = !self.cancel.swap(true, Ordering::SeqCst);
        debug!(newly, "ControlFlags::request_cancel: called");
        if newly {
            self.wakeup.notify_waiters();
        }
        newly
    }

    pub(crate) fn pause_requested(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Park until the pause latch clears or a cancel arrives
    ///
    /// The notified future is enabled before the flags are re-checked, so a
    /// wakeup between the check and the await is never lost.
    pub(crate) async fn wait_while_paused(&self) {
        debug!("ControlFlags::wait_while_paused: called");
        loop {
            let mut notified = pin!(self.wakeup.notified());
            notified.as_mut().enable();
            if !self.pause_requested() || self.cancel_requested() {
                debug!("ControlFlags::wait_while_paused: released");
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_pause_latch_is_idempotent() {
        let flags = ControlFlags::new();
        assert!(flags.request_pause());
        assert!(!flags.request_pause());
        assert!(flags.pause_requested());
    }

    #[test]
    fn test_clear_pause_reports_prior_state() {
        let flags = ControlFlags::new();
        assert!(!flags.clear_pause());
        flags.request_pause();
        assert!(flags.clear_pause());
        assert!(!flags.pause_requested());
    }

    #[test]
    fn test_cancel_latch_is_idempotent() {
        let flags = ControlFlags::new();
        assert!(flags.request_cancel());
        assert!(!flags.request_cancel());
        assert!(flags.cancel_requested());
    }

    #[test]
    fn test_reset_clears_both_latches() {
        let flags = ControlFlags::new();
        flags.request_pause();
        flags.request_cancel();
        flags.reset();
        assert!(!flags.pause_requested());
        assert!(!flags.cancel_requested());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_not_paused() {
        let flags = ControlFlags::new();
        timeout(Duration::from_millis(100), flags.wait_while_paused())
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn test_resume_wakes_waiter() {
        let flags = Arc::new(ControlFlags::new());
        flags.request_pause();

        let waiter = {
            let flags = flags.clone();
            tokio::spawn(async move { flags.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        flags.clear_pause();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_wakes_paused_waiter() {
        let flags = Arc::new(ControlFlags::new());
        flags.request_pause();

        let waiter = {
            let flags = flags.clone();
            tokio::spawn(async move { flags.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        flags.request_cancel();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake on cancel")
            .unwrap();
        // Pause latch stays set; the loop exits on the cancel flag
        assert!(flags.pause_requested());
    }
}

//! Cooperative cancellation for long-running scans.
//!
//! Ingestion and trip scans run on blocking worker threads, where a future
//! cannot simply be dropped. They poll a shared flag between iterations
//! instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Whether `other` is a clone of this flag.
    pub fn same_flag(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }

    /// Returns a guard that cancels this flag when dropped.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Cancels its flag on drop unless disarmed.
///
/// Held by an async caller while blocking work runs, so abandoning the
/// future stops the work at its next check.
#[derive(Debug)]
pub struct CancelOnDrop {
    flag: CancelFlag,
    armed: bool,
}

impl CancelOnDrop {
    /// Keep the work running even after the guard is dropped.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
        assert!(flag.same_flag(&other));
        assert!(!flag.same_flag(&CancelFlag::new()));
    }

    #[test]
    fn guard_cancels_on_drop() {
        let flag = CancelFlag::new();
        {
            let _guard = flag.cancel_on_drop();
        }
        assert!(flag.is_cancelled());
    }

    #[test]
    fn disarmed_guard_does_not_cancel() {
        let flag = CancelFlag::new();
        flag.cancel_on_drop().disarm();
        assert!(!flag.is_cancelled());
    }
}

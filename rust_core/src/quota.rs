//! Run-scoped quota breaker for the classification service.
//!
//! Once the OpenAI account reports `insufficient_quota`, retrying is
//! pointless for the rest of the run: the breaker latches on the first trip
//! and never resets. The ingest loop checks it between games and stops after
//! the current game completes; the classifier is bypassed entirely while
//! tripped.
//!
//! Deliberately not a process-global: each pipeline run owns its breaker and
//! threads clones through, so overlapping runs cannot interfere.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Default)]
pub struct QuotaBreaker {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tripped: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl QuotaBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether quota exhaustion has been observed this run.
    pub fn is_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }

    /// Latch the breaker. Only the first call records a reason; later calls
    /// are no-ops.
    pub fn trip(&self, reason: &str) {
        if !self.inner.tripped.swap(true, Ordering::SeqCst) {
            *self.inner.reason.write() = Some(reason.to_string());
            warn!("Quota breaker tripped: {}. AI classification disabled for the rest of this run.", reason);
        }
    }

    pub fn trip_reason(&self) -> Option<String> {
        self.inner.reason.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untripped() {
        let breaker = QuotaBreaker::new();
        assert!(!breaker.is_tripped());
        assert!(breaker.trip_reason().is_none());
    }

    #[test]
    fn trips_once_and_keeps_first_reason() {
        let breaker = QuotaBreaker::new();
        breaker.trip("insufficient_quota");
        breaker.trip("second trip ignored");
        assert!(breaker.is_tripped());
        assert_eq!(breaker.trip_reason().as_deref(), Some("insufficient_quota"));
    }

    #[test]
    fn clones_share_state() {
        let breaker = QuotaBreaker::new();
        let clone = breaker.clone();
        breaker.trip("quota gone");
        assert!(clone.is_tripped());
    }

    #[test]
    fn separate_runs_do_not_interfere() {
        let run_a = QuotaBreaker::new();
        let run_b = QuotaBreaker::new();
        run_a.trip("quota gone");
        assert!(!run_b.is_tripped());
    }
}

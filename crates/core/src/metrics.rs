use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking dispatch outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages sent with their body inline.
    pub direct: AtomicU64,
    /// Messages sent as a pointer to an offloaded body.
    pub offloaded: AtomicU64,
    /// Calls rejected for invalid input.
    pub input_rejected: AtomicU64,
    /// Calls that failed writing the body to blob storage.
    pub offload_failed: AtomicU64,
    /// Calls that failed sending to the queue.
    pub send_failed: AtomicU64,
}

impl DispatchMetrics {
    pub fn increment_direct(&self) {
        self.direct.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_offloaded(&self) {
        self.offloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_input_rejected(&self) {
        self.input_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_offload_failed(&self) {
        self.offload_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_send_failed(&self) {
        self.send_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            direct: self.direct.load(Ordering::Relaxed),
            offloaded: self.offloaded.load(Ordering::Relaxed),
            input_rejected: self.input_rejected.load(Ordering::Relaxed),
            offload_failed: self.offload_failed.load(Ordering::Relaxed),
            send_failed: self.send_failed.load(Ordering::Relaxed),
        }
    }
}

/// A plain-data copy of [`DispatchMetrics`] at a single point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub direct: u64,
    pub offloaded: u64,
    pub input_rejected: u64,
    pub offload_failed: u64,
    pub send_failed: u64,
}

//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one dispatcher
///
/// The cycle counters (`activations`, `deactivations`, `running_controllers`)
/// are only updated while the queue lock is held.
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total documents submitted
    submitted: AtomicU64,
    /// Total successful dispatches
    dispatched: AtomicU64,
    /// Total documents dropped by the serializer
    encoding_failures: AtomicU64,
    /// Total documents dropped by the transport
    transport_failures: AtomicU64,
    /// Total window firings
    windows_fired: AtomicU64,
    /// Dormant -> Active transitions
    activations: AtomicU64,
    /// Active -> Dormant transitions
    deactivations: AtomicU64,
    /// Controller tasks currently running
    running_controllers: AtomicUsize,
    /// Highest value `running_controllers` ever reached
    peak_controllers: AtomicUsize,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encoding_failures(&self) -> u64 {
        self.encoding_failures.load(Ordering::Relaxed)
    }

    pub fn inc_encoding_failures(&self) {
        self.encoding_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    pub fn inc_transport_failures(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn windows_fired(&self) -> u64 {
        self.windows_fired.load(Ordering::Relaxed)
    }

    pub fn inc_windows_fired(&self) {
        self.windows_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    pub fn deactivations(&self) -> u64 {
        self.deactivations.load(Ordering::Relaxed)
    }

    pub fn running_controllers(&self) -> usize {
        self.running_controllers.load(Ordering::Relaxed)
    }

    pub fn peak_controllers(&self) -> usize {
        self.peak_controllers.load(Ordering::Relaxed)
    }

    /// Record a controller start
    pub fn controller_started(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
        let running = self.running_controllers.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_controllers.fetch_max(running, Ordering::Relaxed);
    }

    /// Record a controller stop
    pub fn controller_stopped(&self) {
        self.deactivations.fetch_add(1, Ordering::Relaxed);
        self.running_controllers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            submitted: self.submitted(),
            dispatched: self.dispatched(),
            encoding_failures: self.encoding_failures(),
            transport_failures: self.transport_failures(),
            windows_fired: self.windows_fired(),
            activations: self.activations(),
            deactivations: self.deactivations(),
            running_controllers: self.running_controllers(),
            peak_controllers: self.peak_controllers(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub submitted: u64,
    pub dispatched: u64,
    pub encoding_failures: u64,
    pub transport_failures: u64,
    pub windows_fired: u64,
    pub activations: u64,
    pub deactivations: u64,
    pub running_controllers: usize,
    pub peak_controllers: usize,
}

impl MetricsSnapshot {
    /// Documents dropped for any reason
    pub fn failed(&self) -> u64 {
        self.encoding_failures + self.transport_failures
    }
}

//! Run summary printed after the queue drains.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::MetricsSummary;

/// Statistics from one `run`
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Documents handed to the dispatcher
    pub submitted: u64,

    /// Wall-clock time from first submit to idle
    pub duration: Duration,

    /// Dispatcher counters at the end of the run
    pub snapshot: MetricsSnapshot,

    /// Window and queue-wait statistics
    pub stats: MetricsSummary,

    /// Failure events received from the dispatcher
    pub failure_events: u64,

    /// Run ended by Ctrl+C before the queue drained
    pub interrupted: bool,
}

impl RunSummary {
    /// Successful dispatches per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.snapshot.dispatched as f64 / secs
        } else {
            0.0
        }
    }

    /// Documents still queued when the run ended
    pub fn abandoned(&self) -> u64 {
        self.submitted
            .saturating_sub(self.snapshot.dispatched + self.snapshot.failed())
    }

    pub fn print_summary(&self) {
        println!("\n=== Dispatch Summary ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Submitted: {}", self.submitted);
        println!("  Dispatched: {}", self.snapshot.dispatched);
        println!(
            "  Failed: {} (encoding {}, transport {})",
            self.snapshot.failed(),
            self.snapshot.encoding_failures,
            self.snapshot.transport_failures
        );
        println!("  Throughput: {:.2} docs/s", self.throughput());
        if self.interrupted {
            println!("  Interrupted with {} documents queued", self.abandoned());
        }

        println!("\nWindows");
        println!("  Fired: {}", self.snapshot.windows_fired);
        println!(
            "  Batch size: mean {:.2}, max {:.0}",
            self.stats.batch_size.mean, self.stats.batch_size.max
        );
        println!(
            "  Queue wait (ms): mean {:.1}, max {:.1}",
            self.stats.queue_wait_ms.mean, self.stats.queue_wait_ms.max
        );
        println!(
            "  Cycle activations: {}, deactivations: {}",
            self.snapshot.activations, self.snapshot.deactivations
        );

        if self.failure_events > 0 {
            println!("\nFailure events received: {}", self.failure_events);
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_and_abandoned() {
        let summary = RunSummary {
            submitted: 10,
            duration: Duration::from_secs(2),
            snapshot: MetricsSnapshot {
                dispatched: 6,
                transport_failures: 1,
                ..Default::default()
            },
            interrupted: true,
            ..Default::default()
        };

        assert_eq!(summary.throughput(), 3.0);
        assert_eq!(summary.abandoned(), 3);
    }

    #[test]
    fn test_zero_duration_throughput() {
        let summary = RunSummary::default();
        assert_eq!(summary.throughput(), 0.0);
        assert_eq!(summary.abandoned(), 0);
    }
}

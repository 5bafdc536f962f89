//! Structured failure events
//!
//! Dropped documents are reported here in addition to the error log, so
//! callers can observe failures without parsing log output.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Serializer rejected the document
    Encoding,
    /// Transport failed to deliver the payload
    Transport,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Transport => "transport",
        }
    }
}

/// One dropped document
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    /// Enqueue sequence of the dropped document
    pub sequence: u64,
    pub kind: FailureKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl DispatchFailure {
    pub fn new(sequence: u64, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            sequence,
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Create a bounded failure channel
pub fn failure_channel(
    capacity: usize,
) -> (mpsc::Sender<DispatchFailure>, mpsc::Receiver<DispatchFailure>) {
    mpsc::channel(capacity)
}

/// Non-blocking sender side used by the cycle controller
#[derive(Debug, Clone)]
pub(crate) struct FailureReporter {
    tx: mpsc::Sender<DispatchFailure>,
}

impl FailureReporter {
    pub(crate) fn new(tx: mpsc::Sender<DispatchFailure>) -> Self {
        Self { tx }
    }

    /// Returns true if the event was queued
    pub(crate) fn report(&self, failure: DispatchFailure) -> bool {
        match self.tx.try_send(failure) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(f)) => {
                warn!(
                    sequence = f.sequence,
                    kind = f.kind.as_str(),
                    "Failure channel full, event dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(f)) => {
                debug!(sequence = f.sequence, "Failure channel closed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reporter_delivers_events() {
        let (tx, mut rx) = failure_channel(4);
        let reporter = FailureReporter::new(tx);

        assert!(reporter.report(DispatchFailure::new(3, FailureKind::Transport, "503")));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.sequence, 3);
        assert_eq!(event.kind, FailureKind::Transport);
        assert_eq!(event.message, "503");
    }

    #[tokio::test]
    async fn test_reporter_never_blocks_when_full() {
        let (tx, _rx) = failure_channel(1);
        let reporter = FailureReporter::new(tx);

        assert!(reporter.report(DispatchFailure::new(0, FailureKind::Encoding, "a")));
        assert!(!reporter.report(DispatchFailure::new(1, FailureKind::Encoding, "b")));
    }

    #[tokio::test]
    async fn test_reporter_tolerates_closed_receiver() {
        let (tx, rx) = failure_channel(1);
        drop(rx);
        let reporter = FailureReporter::new(tx);

        assert!(!reporter.report(DispatchFailure::new(0, FailureKind::Transport, "x")));
    }
}

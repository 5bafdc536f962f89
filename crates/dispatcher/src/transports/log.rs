//! LogTransport - logs payload summaries via tracing

use bytes::Bytes;
use contracts::{ContractError, Transport};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};

const PREVIEW_LEN: usize = 96;

/// Transport that only logs what would have been sent (dry runs)
pub struct LogTransport {
    name: String,
    sent: AtomicU64,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: AtomicU64::new(0),
        }
    }

    /// Number of payloads logged so far
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    fn preview(payload: &[u8]) -> String {
        let text = String::from_utf8_lossy(payload);
        match text.char_indices().nth(PREVIEW_LEN) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, payload),
        fields(transport = %self.name)
    )]
    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        let count = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            transport = %self.name,
            count,
            bytes = payload.len(),
            preview = %Self::preview(&payload),
            "Document payload"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_send() {
        let transport = LogTransport::new("test_log");

        let result = transport.send(Bytes::from_static(b"{\"docId\":\"1\"}")).await;
        assert!(result.is_ok());
        assert_eq!(transport.sent(), 1);
    }

    #[test]
    fn test_log_transport_name() {
        let transport = LogTransport::new("my_logger");
        assert_eq!(transport.name(), "my_logger");
    }

    #[test]
    fn test_preview_truncates_long_payloads() {
        let long = "x".repeat(PREVIEW_LEN + 10);
        let preview = LogTransport::preview(long.as_bytes());
        assert_eq!(preview.len(), PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));

        assert_eq!(LogTransport::preview(b"short"), "short");
    }
}

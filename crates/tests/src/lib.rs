//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试 (文档 JSON 形状)
//! - 配置文件 -> 分发器 e2e 测试
//! - 本地 HTTP 服务端 e2e 测试 (限流、失败事件)
//! - 并发提交压力测试

#[cfg(test)]
mod contract_tests {
    use contracts::Document;

    #[test]
    fn test_document_wire_shape() {
        let doc = Document::sample("42");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["docId"], "42");
        assert!(json["importRequest"].is_boolean());
        assert!(json["description"]["participantInn"].is_string());

        let product = &json["products"][0];
        for key in [
            "certificateDocument",
            "certificateDocumentDate",
            "certificateDocumentNumber",
            "ownerInn",
            "producerInn",
            "productionDate",
            "tnvedCode",
            "uitCode",
            "uituCode",
        ] {
            assert!(product.get(key).is_some(), "missing product field {key}");
        }
        assert!(json.get("doc_id").is_none());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use contracts::Document;
    use dispatcher::{create_dispatcher, CycleState, FailureKind};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::Instant;

    /// Minimal HTTP endpoint recording `(arrival, docId)` per request
    ///
    /// Answers 500 for doc ids listed in `reject`, 200 otherwise.
    struct DocumentEndpoint {
        url: String,
        received: Arc<Mutex<Vec<(Instant, String)>>>,
    }

    impl DocumentEndpoint {
        async fn start(reject: &'static [&'static str]) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let received = Arc::new(Mutex::new(Vec::new()));

            let log = Arc::clone(&received);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let log = Arc::clone(&log);
                    tokio::spawn(async move {
                        let _ = handle_connection(stream, log, reject).await;
                    });
                }
            });

            Self {
                url: format!("http://{addr}/api/v3/lk/documents/create"),
                received,
            }
        }

        fn doc_ids(&self) -> Vec<String> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|(_, id)| id.clone())
                .collect()
        }

        fn arrivals(&self) -> Vec<Instant> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|(at, _)| *at)
                .collect()
        }
    }

    async fn handle_connection(
        mut stream: TcpStream,
        log: Arc<Mutex<Vec<(Instant, String)>>>,
        reject: &[&str],
    ) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let body: serde_json::Value =
            serde_json::from_slice(&buf[head_end..head_end + content_length]).unwrap_or_default();
        let doc_id = body["docId"].as_str().unwrap_or_default().to_string();
        log.lock().unwrap().push((Instant::now(), doc_id.clone()));

        let status = if reject.contains(&doc_id.as_str()) {
            "500 Internal Server Error"
        } else {
            "200 OK"
        };
        let response = format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    /// 共享的测试日志 (重复初始化时忽略错误)
    fn init_logging() {
        let _ = observability::init_tracing(observability::LogFormat::Compact, "debug");
    }

    fn http_blueprint(url: &str, window_ms: u64, max_per_window: i64) -> contracts::DispatcherBlueprint {
        let toml = format!(
            r#"
[rate]
window_ms = {window_ms}
max_per_window = {max_per_window}

[transport]
kind = "http"
url = "{url}"
timeout_ms = 2000
"#
        );
        ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap()
    }

    /// Config file -> loader -> dispatcher with the log transport
    #[tokio::test]
    async fn test_e2e_config_file_to_log_transport() {
        init_logging();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[rate]
window_ms = 30
max_per_window = 4

[transport]
kind = "log"
"#,
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
        let (dispatcher, mut failures) = create_dispatcher(&blueprint).unwrap();

        for i in 0..10 {
            dispatcher.submit(Document::sample(i.to_string()));
        }
        dispatcher.wait_idle().await;

        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.submitted, 10);
        assert_eq!(snapshot.dispatched, 10);
        assert_eq!(snapshot.windows_fired, 3);
        assert_eq!(snapshot.activations, 1);

        let summary: observability::MetricsSummary = dispatcher.stats_summary();
        assert_eq!(summary.total_windows, 3);
        assert_eq!(summary.total_dispatched, 10);
        assert_eq!(summary.total_failed, 0);
        assert_eq!(snapshot.deactivations, 1);
        assert_eq!(dispatcher.cycle_state(), CycleState::Dormant);
        assert!(failures.try_recv().is_err());
    }

    /// Documents reach the endpoint in submission order, two per window
    #[tokio::test]
    async fn test_e2e_http_rate_limited_delivery() {
        init_logging();
        let endpoint = DocumentEndpoint::start(&[]).await;
        let blueprint = http_blueprint(&endpoint.url, 150, 2);
        let (dispatcher, _failures) = create_dispatcher(&blueprint).unwrap();

        let start = Instant::now();
        for i in 0..6 {
            dispatcher.submit(Document::sample(i.to_string()));
        }
        dispatcher.wait_idle().await;

        let expected: Vec<String> = (0..6).map(|i| i.to_string()).collect();
        assert_eq!(endpoint.doc_ids(), expected);
        assert_eq!(dispatcher.metrics().windows_fired(), 3);

        // Third window opens two full windows after the first
        assert!(start.elapsed() >= Duration::from_millis(300));
        let arrivals = endpoint.arrivals();
        assert!(arrivals[2] - arrivals[0] >= Duration::from_millis(100));
        assert!(arrivals[4] - arrivals[2] >= Duration::from_millis(100));
    }

    /// A rejected document is reported and the rest of the window still goes out
    #[tokio::test]
    async fn test_e2e_http_failure_events() {
        init_logging();
        let endpoint = DocumentEndpoint::start(&["1"]).await;
        let blueprint = http_blueprint(&endpoint.url, 50, 5);
        let (dispatcher, mut failures) = create_dispatcher(&blueprint).unwrap();

        for i in 0..4 {
            dispatcher.submit(Document::sample(i.to_string()));
        }
        dispatcher.wait_idle().await;

        assert_eq!(endpoint.doc_ids(), vec!["0", "1", "2", "3"]);

        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.sequence, 1);
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.message.contains("500"), "got: {}", failure.message);
        assert!(failures.try_recv().is_err());

        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.dispatched, 3);
        assert_eq!(snapshot.transport_failures, 1);
        assert_eq!(snapshot.windows_fired, 1);
    }

    /// Unreachable endpoint: every document fails, the cycle still ends
    #[tokio::test]
    async fn test_e2e_http_unreachable_endpoint() {
        init_logging();
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let blueprint = http_blueprint(&format!("http://{addr}/create"), 20, 2);
        let (dispatcher, mut failures) = create_dispatcher(&blueprint).unwrap();

        for i in 0..3 {
            dispatcher.submit(Document::sample(i.to_string()));
        }
        dispatcher.wait_idle().await;

        let mut sequences = Vec::new();
        while let Ok(failure) = failures.try_recv() {
            sequences.push(failure.sequence);
        }
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(dispatcher.metrics().transport_failures(), 3);
        assert_eq!(dispatcher.cycle_state(), CycleState::Dormant);
    }
}

#[cfg(test)]
mod stress_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{ContractError, Transport};
    use dispatcher::{create, CycleState};

    #[derive(Default)]
    struct CountingTransport {
        received: Mutex<Vec<u64>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Transport for CountingTransport {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            let value: u64 = serde_json::from_slice(&payload)
                .map_err(|e| ContractError::transport("counting", e.to_string()))?;
            self.received.lock().unwrap().push(value);
            tokio::task::yield_now().await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Submitters racing the end of a window never start a second controller
    /// and never strand a document
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reactivation_race() {
        let dispatcher = create(Duration::from_millis(1), 2, CountingTransport::default()).unwrap();

        let producers: Vec<_> = (0..4u64)
            .map(|producer| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    for i in 0..40u64 {
                        dispatcher.submit(producer * 1_000 + i);
                        // Irregular gaps so submits land on both sides of deactivation
                        if (i + producer) % 3 == 0 {
                            tokio::time::sleep(Duration::from_millis(2)).await;
                        }
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }
        dispatcher.wait_idle().await;

        let received = dispatcher.transport().received.lock().unwrap().clone();
        assert_eq!(received.len(), 160);
        for producer in 0..4u64 {
            let own: Vec<u64> = received
                .iter()
                .copied()
                .filter(|v| v / 1_000 == producer)
                .collect();
            let expected: Vec<u64> = (0..40).map(|i| producer * 1_000 + i).collect();
            assert_eq!(own, expected);
        }

        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.peak_controllers, 1);
        assert_eq!(snapshot.running_controllers, 0);
        assert_eq!(snapshot.activations, snapshot.deactivations);
        assert!(snapshot.activations >= 1);
        assert_eq!(dispatcher.transport().max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.cycle_state(), CycleState::Dormant);
        assert_eq!(dispatcher.queue_len(), 0);
    }
}

//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::{DispatcherBlueprint, Document, TransportKind};
use dispatcher::{create_dispatcher, DispatchFailure};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::summary::RunSummary;

/// Execute the `run` command
pub async fn run_dispatch(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut blueprint, args)?;

    info!(
        window_ms = blueprint.rate.window_ms,
        max_per_window = blueprint.rate.max_per_window,
        transport = ?blueprint.transport.kind,
        url = %blueprint.transport.url,
        documents = args.documents,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let summary = dispatch_samples(&blueprint, args.documents).await?;

    info!(
        dispatched = summary.snapshot.dispatched,
        failed = summary.snapshot.failed(),
        windows = summary.snapshot.windows_fired,
        duration_secs = summary.duration.as_secs_f64(),
        "Run finished"
    );
    summary.print_summary();

    Ok(())
}

/// Apply CLI overrides and re-validate
fn apply_overrides(blueprint: &mut DispatcherBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(window_ms) = args.window_ms {
        info!(window_ms, "Overriding rate window from CLI");
        blueprint.rate.window_ms = window_ms;
    }
    if let Some(max_per_window) = args.max_per_window {
        info!(max_per_window, "Overriding per-window limit from CLI");
        blueprint.rate.max_per_window = max_per_window;
    }
    if args.dry_run {
        info!("Dry run mode - payloads are logged instead of sent");
        blueprint.transport.kind = TransportKind::Log;
    }

    ConfigLoader::validate(blueprint).map_err(|e| CliError::config_validation(e.to_string()))
}

/// Submit `count` sample documents and wait for the queue to drain
async fn dispatch_samples(blueprint: &DispatcherBlueprint, count: u64) -> Result<RunSummary> {
    let (dispatcher, mut failures) = create_dispatcher(blueprint).map_err(CliError::from)?;

    let start = Instant::now();
    for doc_id in 0..count {
        dispatcher.submit(Document::sample(doc_id.to_string()));
    }

    let mut failure_events = 0u64;
    let idle = dispatcher.wait_idle();
    let shutdown = shutdown_signal();
    tokio::pin!(idle, shutdown);

    let interrupted = loop {
        tokio::select! {
            Some(failure) = failures.recv() => {
                failure_events += 1;
                log_failure(&failure);
            }
            _ = &mut idle => break false,
            _ = &mut shutdown => {
                warn!(
                    queued = dispatcher.queue_len(),
                    "Received shutdown signal, abandoning queued documents"
                );
                break true;
            }
        }
    };

    // Events are sent before the cycle goes dormant
    failure_events += drain_failures(&mut failures);

    Ok(RunSummary {
        submitted: count,
        duration: start.elapsed(),
        snapshot: dispatcher.metrics().snapshot(),
        stats: dispatcher.stats_summary(),
        failure_events,
        interrupted,
    })
}

fn drain_failures(failures: &mut mpsc::Receiver<DispatchFailure>) -> u64 {
    let mut drained = 0;
    while let Ok(failure) = failures.try_recv() {
        drained += 1;
        log_failure(&failure);
    }
    drained
}

fn log_failure(failure: &DispatchFailure) {
    warn!(
        sequence = failure.sequence,
        kind = failure.kind.as_str(),
        at = %failure.occurred_at,
        message = %failure.message,
        "Document dropped"
    );
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::ConfigFormat;
    use std::io::Write;
    use std::path::PathBuf;

    const CONFIG: &str = r#"
[rate]
window_ms = 20
max_per_window = 2

[transport]
kind = "log"
"#;

    fn args_for(config: PathBuf) -> RunArgs {
        RunArgs {
            config,
            documents: 5,
            window_ms: None,
            max_per_window: None,
            dry_run: false,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_overrides_applied_and_validated() {
        let mut blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        blueprint.transport.kind = TransportKind::Http;

        let mut args = args_for(PathBuf::from("unused.toml"));
        args.window_ms = Some(250);
        args.max_per_window = Some(7);
        args.dry_run = true;

        apply_overrides(&mut blueprint, &args).unwrap();
        assert_eq!(blueprint.rate.window_ms, 250);
        assert_eq!(blueprint.rate.max_per_window, 7);
        assert_eq!(blueprint.transport.kind, TransportKind::Log);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let mut args = args_for(PathBuf::from("unused.toml"));
        args.max_per_window = Some(0);

        let err = apply_overrides(&mut blueprint, &args).unwrap_err();
        assert!(matches!(err, CliError::ConfigValidation { .. }));
        assert!(err.to_string().contains("max_per_window"));
    }

    #[tokio::test]
    async fn test_dispatch_samples_drains_queue() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();

        let summary = dispatch_samples(&blueprint, 5).await.unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.snapshot.dispatched, 5);
        assert_eq!(summary.snapshot.windows_fired, 3);
        assert_eq!(summary.failure_events, 0);
        assert_eq!(summary.abandoned(), 0);
    }

    #[tokio::test]
    async fn test_run_missing_config() {
        let args = args_for(PathBuf::from("/nonexistent/dispatch.toml"));
        let err = run_dispatch(&args).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_run_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let args = args_for(file.path().to_path_buf());
        run_dispatch(&args).await.unwrap();
    }
}

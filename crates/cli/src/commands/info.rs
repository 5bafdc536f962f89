//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{DispatcherBlueprint, TransportKind};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    rate: RateInfo,
    transport: TransportInfo,
    failures: FailureInfo,
}

#[derive(Serialize)]
struct RateInfo {
    window_ms: u64,
    max_per_window: i64,
    /// Upper bound on dispatch attempts per second
    max_per_second: f64,
}

#[derive(Serialize)]
struct TransportInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    timeout_ms: u64,
    content_type: String,
}

#[derive(Serialize)]
struct FailureInfo {
    channel_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &DispatcherBlueprint) -> ConfigInfo {
    let rate = &blueprint.rate;
    let max_per_second = if rate.window_ms > 0 {
        rate.max_per_window as f64 * 1000.0 / rate.window_ms as f64
    } else {
        0.0
    };

    let transport = &blueprint.transport;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        rate: RateInfo {
            window_ms: rate.window_ms,
            max_per_window: rate.max_per_window,
            max_per_second,
        },
        transport: TransportInfo {
            kind: format!("{:?}", transport.kind),
            url: (transport.kind == TransportKind::Http).then(|| transport.url.clone()),
            timeout_ms: transport.timeout_ms,
            content_type: transport.content_type.clone(),
        },
        failures: FailureInfo {
            channel_capacity: blueprint.failures.channel_capacity,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== CRPT Dispatch Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nRate");
    println!("   ├─ Window: {}ms", info.rate.window_ms);
    println!("   ├─ Max per window: {}", info.rate.max_per_window);
    println!("   └─ Max per second: {:.2}", info.rate.max_per_second);

    println!("\nTransport");
    println!("   ├─ Kind: {}", info.transport.kind);
    if let Some(ref url) = info.transport.url {
        println!("   ├─ URL: {}", url);
    }
    println!("   ├─ Timeout: {}ms", info.transport.timeout_ms);
    println!("   └─ Content-Type: {}", info.transport.content_type);

    println!("\nFailure events");
    println!("   └─ Channel capacity: {}", info.failures.channel_capacity);

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_build_config_info() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[rate]
window_ms = 500
max_per_window = 4
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&blueprint);
        assert_eq!(info.rate.max_per_second, 8.0);
        assert_eq!(info.transport.kind, "Http");
        assert_eq!(info.transport.url.as_deref(), Some(contracts::DEFAULT_ENDPOINT));
        assert_eq!(info.failures.channel_capacity, 64);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["rate"]["window_ms"], 500);
    }

    #[test]
    fn test_log_transport_hides_url() {
        let blueprint = ConfigLoader::load_from_str(
            r#"{"rate": {"window_ms": 1000, "max_per_window": 1}, "transport": {"kind": "log"}}"#,
            ConfigFormat::Json,
        )
        .unwrap();

        let info = build_config_info(&blueprint);
        assert!(info.transport.url.is_none());
        let json = serde_json::to_value(&info).unwrap();
        assert!(json["transport"].get("url").is_none());
    }
}

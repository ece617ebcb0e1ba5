//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ScrollSyncConfig;
use tracing::info;

use crate::cli::InfoArgs;
use crate::simulation::load_config;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    match &args.config {
        Some(path) => info!(config = %path.display(), "Loading configuration info"),
        None => info!("No configuration file given, showing defaults"),
    }

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn print_config_info(config: &ScrollSyncConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Scroll Sync Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let source = args
        .config
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    println!("📄 Source");
    println!("   ├─ File: {}", source);
    println!("   └─ Version: {:?}", config.version);

    let engine = &config.engine;
    println!("\n⚙️  Engine");
    println!("   ├─ Settle grace: {} ms", engine.settle_grace_ms);
    println!("   ├─ Frame interval: {} ms", engine.frame_interval_ms);
    println!("   ├─ Id attribute: {}", engine.id_attribute);
    println!("   └─ Command queue: {}", engine.command_queue_capacity);

    let telemetry = &config.telemetry;
    println!("\n📡 Telemetry");
    println!("   ├─ Log format: {:?}", telemetry.log_format);
    println!("   ├─ Log level: {}", telemetry.log_level);
    match telemetry.metrics_port {
        Some(port) => println!("   └─ Metrics: 0.0.0.0:{}", port),
        None => println!("   └─ Metrics: disabled"),
    }

    println!();
}

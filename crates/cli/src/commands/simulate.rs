//! `simulate` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::SimulateArgs;
use crate::simulation::{load_config, run_live, run_offline, Scenario, SimulationReport};

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let scenario = Scenario::from(args);

    info!(
        regions = scenario.regions,
        gestures = scenario.gestures,
        events = scenario.events,
        offline = args.offline,
        settle_grace_ms = config.engine.settle_grace_ms,
        frame_interval_ms = config.engine.frame_interval_ms,
        "Starting simulation"
    );

    if let Some(port) = args.metrics_port.or(config.telemetry.metrics_port) {
        observability::init_metrics_only(port)?;
    }

    if args.offline {
        let report = run_offline(&config, &scenario)?;
        return finish(&report, args);
    }

    let simulation = async {
        match args.timeout {
            0 => run_live(&config, &scenario).await.map_err(anyhow::Error::from),
            secs => {
                match tokio::time::timeout(Duration::from_secs(secs), run_live(&config, &scenario))
                    .await
                {
                    Ok(result) => result.map_err(anyhow::Error::from),
                    Err(_) => Err(anyhow::anyhow!("Simulation timed out after {secs}s")),
                }
            }
        }
    };

    tokio::select! {
        result = simulation => {
            let report = result.context("Simulation failed")?;
            finish(&report, args)
        }
        _ = setup_shutdown_signal() => {
            warn!("Received shutdown signal, stopping simulation...");
            Ok(())
        }
    }
}

fn finish(report: &SimulationReport, args: &SimulateArgs) -> Result<()> {
    observability::record_engine_stats(&report.stats);

    if args.json {
        let json =
            serde_json::to_string_pretty(report).context("Failed to serialize simulation report")?;
        println!("{}", json);
    } else {
        report.print_summary();
    }

    if !report.is_synchronized() {
        anyhow::bail!(
            "Regions drifted apart (max drift {:.3} px)",
            report.max_drift
        );
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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

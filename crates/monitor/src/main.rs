//! newrelic-monitor - host metrics reporter
//!
//! Samples CPU, memory, swap, disk and EC2 burst credits once a minute and
//! posts them to the New Relic plugin API.

use anyhow::{Context, Result};
use monitor_lib::cloud::{known_instance_types, CloudWatchCli, MetadataClient};
use monitor_lib::collector::{CreditSampler, Sampler, SysinfoProbe};
use monitor_lib::{HttpReporter, ReportLoopBuilder, StructuredLogger};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const MONITOR_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    if let Err(e) = run().await {
        error!(version = MONITOR_VERSION, error = %format!("{:#}", e), "Fatal startup error");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = config::MonitorConfig::load()?;

    // Credentials and host identity are required before any sampling
    let credentials = config.credentials();
    let license_key = credentials
        .resolve()
        .with_context(|| format!("Failed to resolve license key ({})", credentials.describe()))?;

    let host = SysinfoProbe::host_name().context("Can't determine hostname")?;

    let logger = StructuredLogger::new(&host, MONITOR_VERSION);

    let probe = Arc::new(SysinfoProbe::new(config.cpu_snapshots()));
    let mut sampler = Sampler::new(probe, config.probe_timeout(), logger.clone());

    if config.credit_enabled {
        let metadata = MetadataClient::new(&config.metadata_url, config.metadata_timeout())?;
        let balance = CloudWatchCli::new(config.cloudwatch());
        sampler = sampler.with_credit(CreditSampler::new(
            Arc::new(metadata),
            Arc::new(balance),
            config.credit_timeout(),
        ));
        info!(
            instance_types = ?known_instance_types(),
            "Burst credit sampling enabled"
        );
    }

    logger.log_startup(
        &credentials.describe(),
        config.interval_secs,
        sampler.credit_enabled(),
    );

    let reporter = HttpReporter::new(&config.endpoint, &license_key, config.http_timeout())?;
    info!(endpoint = %reporter.endpoint(), "Reporter configured");

    let report_loop = ReportLoopBuilder::new()
        .sampler(sampler)
        .sink(Arc::new(reporter))
        .logger(logger.clone())
        .interval(config.interval())
        .build()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let loop_handle = tokio::spawn(report_loop.run(shutdown_rx));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());
    loop_handle.await.context("Report loop panicked")?;

    Ok(())
}

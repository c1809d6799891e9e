//! Report loop
//!
//! Samples every metric, encodes the report, sends it, then sleeps for the
//! configured interval before starting over. The sleep starts after the
//! send finishes, so a slow cycle pushes the next one back rather than
//! overlapping it.

use crate::collector::Sampler;
use crate::models::REPORT_DURATION_SECS;
use crate::observability::StructuredLogger;
use crate::report::Report;
use crate::reporter::{Delivery, ReportSink};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::info;

/// Configuration for the report loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between the end of one send and the next sample (default: 60 seconds)
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(REPORT_DURATION_SECS),
        }
    }
}

/// Periodic sample → encode → send loop
pub struct ReportLoop {
    sampler: Sampler,
    sink: Arc<dyn ReportSink>,
    logger: StructuredLogger,
    config: SchedulerConfig,
}

impl ReportLoop {
    pub fn new(
        sampler: Sampler,
        sink: Arc<dyn ReportSink>,
        logger: StructuredLogger,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sampler,
            sink,
            logger,
            config,
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Run one full cycle without sleeping
    pub async fn run_cycle(&self) -> Delivery {
        let samples = self.sampler.sample_all().await;
        let report = Report::encode(self.logger.host(), self.logger.version(), &samples);

        let delivery = self.sink.send(&report).await;
        match &delivery {
            Delivery::Sent { payload, status } => self.logger.log_report_sent(payload, status),
            Delivery::Failed { error } => self.logger.log_report_failed(error),
        }
        delivery
    }

    /// Run until a shutdown signal arrives
    ///
    /// Failed cycles never end the loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting report loop"
        );

        let mut cycle = 0u64;

        loop {
            let start = Instant::now();
            let delivery = self.run_cycle().await;
            cycle += 1;
            self.logger
                .log_cycle_complete(cycle, delivery.is_sent(), start.elapsed().as_millis());

            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = shutdown.recv() => {
                    info!("Shutting down report loop");
                    break;
                }
            }
        }
    }
}

/// Builder for the report loop
pub struct ReportLoopBuilder {
    sampler: Option<Sampler>,
    sink: Option<Arc<dyn ReportSink>>,
    logger: Option<StructuredLogger>,
    config: SchedulerConfig,
}

impl ReportLoopBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            sampler: None,
            sink: None,
            logger: None,
            config: SchedulerConfig::default(),
        }
    }

    /// Set the sampler
    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Set the report destination
    pub fn sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the logger carrying host and version
    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the pause between cycles
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Build the report loop
    pub fn build(self) -> Result<ReportLoop> {
        let sampler = self
            .sampler
            .ok_or_else(|| anyhow::anyhow!("Sampler is required"))?;
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Report sink is required"))?;
        let logger = self
            .logger
            .ok_or_else(|| anyhow::anyhow!("Logger is required"))?;

        Ok(ReportLoop::new(sampler, sink, logger, self.config))
    }
}

impl Default for ReportLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Host resource sampling
//!
//! Raw host queries go through the [`HostProbe`] trait; the [`Sampler`]
//! turns them into integer percentages. Every sampler degrades to 0 on
//! failure so a broken query never stalls the report loop.

mod credit;
mod host;

#[cfg(test)]
mod tests;

pub use credit::CreditSampler;
pub use host::{CpuSnapshotConfig, SysinfoProbe};

use crate::models::{FilesystemUsage, Samples, UsageCounters};
use crate::observability::StructuredLogger;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use async_trait::async_trait;

/// Trait for host resource accounting implementations
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Average CPU busy percentage over a short sampling window
    async fn cpu_percent(&self) -> Result<f64>;

    /// Used and total physical memory
    async fn memory(&self) -> Result<UsageCounters>;

    /// Used and total swap
    async fn swap(&self) -> Result<UsageCounters>;

    /// Space accounting for every mounted filesystem
    async fn filesystems(&self) -> Result<Vec<FilesystemUsage>>;
}

/// Highest used percentage across block-device-backed mounts
///
/// Returns 0 when no such mount exists.
pub fn fullest_disk_percent(filesystems: &[FilesystemUsage]) -> u32 {
    filesystems
        .iter()
        .filter(|fs| fs.is_block_device())
        .map(FilesystemUsage::used_percent)
        .max()
        .unwrap_or(0)
}

/// Convert a CPU reading to an integer percentage
pub fn cpu_percent_value(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.min(100.0) as u32
}

/// Runs every sampler once per cycle
pub struct Sampler {
    probe: Arc<dyn HostProbe>,
    credit: Option<CreditSampler>,
    timeout: Duration,
    logger: StructuredLogger,
}

impl Sampler {
    /// Create a sampler over the given probe
    pub fn new(probe: Arc<dyn HostProbe>, timeout: Duration, logger: StructuredLogger) -> Self {
        Self {
            probe,
            credit: None,
            timeout,
            logger,
        }
    }

    /// Enable burst-credit sampling
    pub fn with_credit(mut self, credit: CreditSampler) -> Self {
        self.credit = Some(credit);
        self
    }

    /// Whether the credit metric is part of each sample set
    pub fn credit_enabled(&self) -> bool {
        self.credit.is_some()
    }

    /// Sample every metric sequentially
    pub async fn sample_all(&self) -> Samples {
        Samples {
            cpu: self.cpu().await,
            disk: self.fullest_disk().await,
            memory: self.memory().await,
            swap: self.swap().await,
            credit: match &self.credit {
                Some(credit) => Some(credit.sample(&self.logger).await),
                None => None,
            },
        }
    }

    pub async fn cpu(&self) -> u32 {
        self.guarded("cpu", self.probe.cpu_percent())
            .await
            .map(cpu_percent_value)
            .unwrap_or(0)
    }

    pub async fn memory(&self) -> u32 {
        self.guarded("memory", self.probe.memory())
            .await
            .map(|counters| counters.percent())
            .unwrap_or(0)
    }

    pub async fn swap(&self) -> u32 {
        self.guarded("swap", self.probe.swap())
            .await
            .map(|counters| counters.percent())
            .unwrap_or(0)
    }

    pub async fn fullest_disk(&self) -> u32 {
        self.guarded("disk", self.probe.filesystems())
            .await
            .map(|filesystems| fullest_disk_percent(&filesystems))
            .unwrap_or(0)
    }

    /// Apply the timeout and log any failure
    async fn guarded<T>(&self, metric: &str, query: impl Future<Output = Result<T>>) -> Option<T> {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                self.logger.log_sample_degraded(metric, &format!("{:#}", e));
                None
            }
            Err(_) => {
                self.logger
                    .log_sample_degraded(metric, &format!("timed out after {:?}", self.timeout));
                None
            }
        }
    }
}

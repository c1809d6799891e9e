//! Host probe backed by the `sysinfo` crate
//!
//! Reads CPU, memory, swap and filesystem usage through native OS
//! interfaces instead of parsing the output of `top`, `free` or `df`.

use super::HostProbe;
use crate::models::{FilesystemUsage, UsageCounters};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use sysinfo::{Disks, System};
use tokio::time::sleep;

/// Fewest snapshots averaged into a CPU reading
pub const MIN_CPU_SNAPSHOTS: usize = 3;

/// Longest gap between CPU snapshots; readings stay sub-second
pub const MAX_CPU_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(900);

/// CPU snapshot schedule
#[derive(Debug, Clone)]
pub struct CpuSnapshotConfig {
    /// Snapshots averaged into the reading, after the discarded baseline
    pub snapshots: usize,
    /// Delay between snapshots
    pub interval: Duration,
}

impl Default for CpuSnapshotConfig {
    fn default() -> Self {
        Self {
            snapshots: 3,
            interval: Duration::from_millis(500),
        }
    }
}

/// Production [`HostProbe`]
pub struct SysinfoProbe {
    cpu: CpuSnapshotConfig,
}

impl SysinfoProbe {
    pub fn new(cpu: CpuSnapshotConfig) -> Self {
        // sysinfo needs a minimum gap between CPU refreshes to compute usage
        let cpu = CpuSnapshotConfig {
            snapshots: cpu.snapshots.max(MIN_CPU_SNAPSHOTS),
            interval: cpu
                .interval
                .max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
                .min(MAX_CPU_SNAPSHOT_INTERVAL),
        };
        Self { cpu }
    }

    /// Local host name, used as the report's agent host
    pub fn host_name() -> Option<String> {
        System::host_name().filter(|name| !name.trim().is_empty())
    }

    async fn memory_snapshot() -> Result<(UsageCounters, UsageCounters)> {
        tokio::task::spawn_blocking(|| {
            let mut system = System::new();
            system.refresh_memory();
            (
                UsageCounters::new(system.used_memory(), system.total_memory()),
                UsageCounters::new(system.used_swap(), system.total_swap()),
            )
        })
        .await
        .context("Memory query task failed")
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new(CpuSnapshotConfig::default())
    }
}

/// Mean of the collected CPU readings
pub(crate) fn average_cpu(readings: &[f32]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    let sum: f64 = readings.iter().map(|v| *v as f64).sum();
    Some(sum / readings.len() as f64)
}

#[async_trait]
impl HostProbe for SysinfoProbe {
    async fn cpu_percent(&self) -> Result<f64> {
        let mut system = System::new();

        // Baseline refresh; usage is computed from deltas so this one is dropped
        system.refresh_cpu();

        let mut readings = Vec::with_capacity(self.cpu.snapshots);
        for _ in 0..self.cpu.snapshots {
            sleep(self.cpu.interval).await;
            system.refresh_cpu();
            readings.push(system.global_cpu_info().cpu_usage());
        }

        average_cpu(&readings).context("No CPU snapshots collected")
    }

    async fn memory(&self) -> Result<UsageCounters> {
        let (memory, _) = Self::memory_snapshot().await?;
        if memory.total == 0 {
            anyhow::bail!("Total memory reported as zero");
        }
        Ok(memory)
    }

    async fn swap(&self) -> Result<UsageCounters> {
        let (_, swap) = Self::memory_snapshot().await?;
        Ok(swap)
    }

    async fn filesystems(&self) -> Result<Vec<FilesystemUsage>> {
        tokio::task::spawn_blocking(|| {
            let disks = Disks::new_with_refreshed_list();
            disks
                .list()
                .iter()
                .map(|disk| FilesystemUsage {
                    device: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    total_bytes: disk.total_space(),
                    available_bytes: disk.available_space(),
                })
                .collect()
        })
        .await
        .context("Filesystem query task failed")
    }
}

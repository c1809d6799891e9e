//! Core data models for the metrics reporter

use serde::{Deserialize, Serialize};

/// Plugin GUID the ingestion API files every component under
pub const PLUGIN_GUID: &str = "au.com.lexer.plugin.Servers";

/// Reporting window in seconds, also the default poll interval
pub const REPORT_DURATION_SECS: u64 = 60;

/// Stable metric keys understood by the plugin dashboards
pub mod metric_keys {
    pub const CPU: &str = "Component/CPU[percent]";
    pub const DISK: &str = "Component/Disk[percent]";
    pub const MEMORY: &str = "Component/Memory[percent]";
    pub const SWAP: &str = "Component/Swap[percent]";
    pub const CPU_CREDIT: &str = "Component/CPUCredit[percent]";
}

/// One cycle's worth of sampled percentages
///
/// `credit` is `None` when burst-credit sampling is disabled, in which case
/// the credit key is left out of the report entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Samples {
    pub cpu: u32,
    pub disk: u32,
    pub memory: u32,
    pub swap: u32,
    pub credit: Option<u32>,
}

/// Used/total counters for memory or swap, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounters {
    pub used: u64,
    pub total: u64,
}

impl UsageCounters {
    pub fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Used share as an integer percentage, 0 when nothing is configured
    pub fn percent(&self) -> u32 {
        percent_of(self.used as f64, self.total as f64)
    }
}

/// Space accounting for one mounted filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemUsage {
    pub device: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl FilesystemUsage {
    /// Whether the mount is backed by a real block device
    pub fn is_block_device(&self) -> bool {
        self.device.starts_with("/dev/")
    }

    /// Share of the filesystem unavailable to unprivileged users
    ///
    /// Blocks reserved for root count as used, since only total and
    /// available space are known. `df` instead reports
    /// `used / (used + avail)` rounded up, so it can read a few points lower.
    pub fn used_percent(&self) -> u32 {
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        percent_of(used as f64, self.total_bytes as f64)
    }
}

/// Burst-capable EC2 instance classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceType {
    pub name: &'static str,
    pub maximum_credits: f64,
    pub credits_earned_per_hour: f64,
}

impl InstanceType {
    /// Entry used for instance types missing from the table
    pub const UNKNOWN: InstanceType = InstanceType {
        name: "",
        maximum_credits: 0.0,
        credits_earned_per_hour: 0.0,
    };

    /// Credit balance as a percentage of this type's ceiling
    pub fn credit_percent(&self, balance: f64) -> u32 {
        percent_of(balance, self.maximum_credits)
    }
}

/// Integer-truncated `part / whole * 100`, clamped to [0, 100]
///
/// Non-finite inputs and an empty `whole` yield 0.
pub fn percent_of(part: f64, whole: f64) -> u32 {
    if !part.is_finite() || !whole.is_finite() || whole <= 0.0 || part <= 0.0 {
        return 0;
    }
    let value = (part / whole) * 100.0;
    value.min(100.0) as u32
}

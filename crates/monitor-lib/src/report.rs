//! Report payload for the plugin ingestion API

use crate::models::{metric_keys, Samples, PLUGIN_GUID, REPORT_DURATION_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting agent identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub host: String,
    pub version: String,
}

/// One plugin component and its metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub guid: String,
    pub duration: u64,
    pub metrics: BTreeMap<String, u32>,
}

/// Outbound payload, built once per cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub agent: AgentInfo,
    pub components: Vec<Component>,
}

impl Report {
    /// Encode one cycle's samples for `host`
    ///
    /// The component is named after the host. Zero values are kept; the
    /// credit key appears only when a credit sample was taken.
    pub fn encode(host: &str, version: &str, samples: &Samples) -> Self {
        Self {
            agent: AgentInfo {
                host: host.to_string(),
                version: version.to_string(),
            },
            components: vec![Component {
                name: host.to_string(),
                guid: PLUGIN_GUID.to_string(),
                duration: REPORT_DURATION_SECS,
                metrics: metric_map(samples),
            }],
        }
    }

    /// Compact single-line JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize report")
    }
}

/// Map samples onto their stable metric keys
pub fn metric_map(samples: &Samples) -> BTreeMap<String, u32> {
    let mut metrics = BTreeMap::new();
    metrics.insert(metric_keys::CPU.to_string(), samples.cpu);
    metrics.insert(metric_keys::DISK.to_string(), samples.disk);
    metrics.insert(metric_keys::MEMORY.to_string(), samples.memory);
    metrics.insert(metric_keys::SWAP.to_string(), samples.swap);
    if let Some(credit) = samples.credit {
        metrics.insert(metric_keys::CPU_CREDIT.to_string(), credit);
    }
    metrics
}

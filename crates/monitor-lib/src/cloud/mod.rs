//! EC2 lookups used by the burst-credit sampler
//!
//! - Instance identity and type from the link-local metadata service
//! - Static burst-credit table keyed by instance type
//! - Minimum CPU credit balance from CloudWatch

mod cloudwatch;
mod instance_types;
mod metadata;

pub use cloudwatch::{parse_minimum_datapoint, CloudWatchCli, CloudWatchConfig};
pub use instance_types::{instance_type, known_instance_types};
pub use metadata::{MetadataClient, DEFAULT_METADATA_URL};

use anyhow::Result;
use async_trait::async_trait;

/// Read access to the instance identity documents
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    /// Opaque instance identifier, e.g. `i-0abc...`
    async fn instance_id(&self) -> Result<String>;

    /// Instance type name, e.g. `t3.micro`
    async fn instance_type(&self) -> Result<String>;
}

/// Source of the recent CPU credit balance for an instance
#[async_trait]
pub trait CreditBalanceSource: Send + Sync {
    /// Minimum credit balance over the recent window, `None` without data
    async fn minimum_balance(&self, instance_id: &str) -> Result<Option<f64>>;
}

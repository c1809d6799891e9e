//! Burst-credit balance sampling

use crate::cloud::{instance_type, CreditBalanceSource, InstanceMetadata};
use crate::observability::StructuredLogger;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Samples the remaining CPU credit balance as a percentage of the ceiling
pub struct CreditSampler {
    metadata: Arc<dyn InstanceMetadata>,
    balance: Arc<dyn CreditBalanceSource>,
    timeout: Duration,
}

impl CreditSampler {
    pub fn new(
        metadata: Arc<dyn InstanceMetadata>,
        balance: Arc<dyn CreditBalanceSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            metadata,
            balance,
            timeout,
        }
    }

    /// Credit percentage, 0 on any failure
    pub async fn sample(&self, logger: &StructuredLogger) -> u32 {
        match tokio::time::timeout(self.timeout, self.credit_percent()).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                logger.log_sample_degraded("credit", &format!("{:#}", e));
                0
            }
            Err(_) => {
                logger.log_sample_degraded("credit", &format!("timed out after {:?}", self.timeout));
                0
            }
        }
    }

    /// Resolve identity, query the balance and scale it by the type ceiling
    pub async fn credit_percent(&self) -> Result<u32> {
        let instance_id = self
            .metadata
            .instance_id()
            .await
            .context("Failed to resolve instance id")?;

        let balance = self
            .balance
            .minimum_balance(&instance_id)
            .await
            .context("Failed to query credit balance")?;

        let Some(balance) = balance else {
            tracing::debug!(instance_id = %instance_id, "No credit balance datapoint in window");
            return Ok(0);
        };

        let type_name = self
            .metadata
            .instance_type()
            .await
            .context("Failed to resolve instance type")?;

        let instance = instance_type(&type_name);
        if instance.maximum_credits <= 0.0 {
            tracing::debug!(instance_type = %type_name, "Instance type has no credit ceiling");
            return Ok(0);
        }

        Ok(instance.credit_percent(balance))
    }
}

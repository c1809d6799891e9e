//! CPU credit balance from CloudWatch
//!
//! There is no native CloudWatch client in this stack, so the query shells
//! out to `aws cloudwatch get-metric-statistics` and parses its JSON output.

use super::CreditBalanceSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Configuration for the CloudWatch query
#[derive(Debug, Clone)]
pub struct CloudWatchConfig {
    /// Executable to run (default: `aws`)
    pub program: String,
    /// AWS region to query
    pub region: String,
    /// How far back the statistic window reaches
    pub window: Duration,
    /// Statistic period in seconds
    pub period_secs: u64,
    /// Upper bound on the command's run time
    pub timeout: Duration,
}

impl Default for CloudWatchConfig {
    fn default() -> Self {
        Self {
            program: "aws".to_string(),
            region: "ap-southeast-2".to_string(),
            window: Duration::from_secs(600),
            period_secs: 3600,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Runs the `aws` CLI to read the `CPUCreditBalance` minimum
pub struct CloudWatchCli {
    config: CloudWatchConfig,
}

impl CloudWatchCli {
    pub fn new(config: CloudWatchConfig) -> Self {
        Self { config }
    }

    /// Build the argument list for a query ending at `end`
    pub fn build_args(&self, instance_id: &str, end: DateTime<Utc>) -> Vec<String> {
        let window = ChronoDuration::from_std(self.config.window)
            .unwrap_or_else(|_| ChronoDuration::minutes(10));
        let start = end - window;

        vec![
            "cloudwatch".to_string(),
            "get-metric-statistics".to_string(),
            "--namespace".to_string(),
            "AWS/EC2".to_string(),
            "--metric-name".to_string(),
            "CPUCreditBalance".to_string(),
            "--region".to_string(),
            self.config.region.clone(),
            "--dimensions".to_string(),
            format!("Name=InstanceId,Value={}", instance_id),
            "--start-time".to_string(),
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "--end-time".to_string(),
            end.to_rfc3339_opts(SecondsFormat::Secs, true),
            "--period".to_string(),
            self.config.period_secs.to_string(),
            "--statistics".to_string(),
            "Minimum".to_string(),
            "--unit".to_string(),
            "Count".to_string(),
            "--output".to_string(),
            "json".to_string(),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<String> {
        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.config.program))?;

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!("CloudWatch query timed out after {:?}", self.config.timeout)
            })?
            .context("Failed to wait for CloudWatch query")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "CloudWatch query exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("CloudWatch output is not UTF-8")
    }
}

#[async_trait]
impl CreditBalanceSource for CloudWatchCli {
    async fn minimum_balance(&self, instance_id: &str) -> Result<Option<f64>> {
        let args = self.build_args(instance_id, Utc::now());
        let output = self.run(args).await?;
        debug!(output = %output.trim(), "CloudWatch query output");
        parse_minimum_datapoint(&output)
    }
}

#[derive(Debug, Deserialize)]
struct MetricStatistics {
    #[serde(rename = "Datapoints", default)]
    datapoints: Vec<Datapoint>,
}

#[derive(Debug, Deserialize)]
struct Datapoint {
    #[serde(rename = "Minimum")]
    minimum: Option<f64>,
}

/// Extract `Datapoints[0].Minimum` from `get-metric-statistics` JSON
///
/// An empty datapoint list yields `Ok(None)`; malformed JSON is an error.
pub fn parse_minimum_datapoint(json: &str) -> Result<Option<f64>> {
    let stats: MetricStatistics =
        serde_json::from_str(json).context("Failed to parse CloudWatch output")?;
    Ok(stats.datapoints.first().and_then(|point| point.minimum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_minimum_datapoint() {
        let json = r#"{
            "Label": "CPUCreditBalance",
            "Datapoints": [
                {"Timestamp": "2024-01-01T00:00:00Z", "Minimum": 57.6, "Unit": "Count"}
            ]
        }"#;
        assert_eq!(parse_minimum_datapoint(json).unwrap(), Some(57.6));
    }

    #[test]
    fn test_parse_no_datapoints() {
        let json = r#"{"Label": "CPUCreditBalance", "Datapoints": []}"#;
        assert_eq!(parse_minimum_datapoint(json).unwrap(), None);

        let json = r#"{"Label": "CPUCreditBalance"}"#;
        assert_eq!(parse_minimum_datapoint(json).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed_output() {
        assert!(parse_minimum_datapoint("null").is_err());
        assert!(parse_minimum_datapoint("Unable to locate credentials").is_err());
    }

    #[test]
    fn test_build_args() {
        let cli = CloudWatchCli::new(CloudWatchConfig::default());
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let args = cli.build_args("i-abc", end);

        let value_after = |flag: &str| {
            let idx = args.iter().position(|a| a == flag).unwrap();
            args[idx + 1].clone()
        };

        assert_eq!(value_after("--metric-name"), "CPUCreditBalance");
        assert_eq!(value_after("--region"), "ap-southeast-2");
        assert_eq!(value_after("--dimensions"), "Name=InstanceId,Value=i-abc");
        assert_eq!(value_after("--start-time"), "2024-03-01T11:50:00Z");
        assert_eq!(value_after("--end-time"), "2024-03-01T12:00:00Z");
        assert_eq!(value_after("--period"), "3600");
        assert_eq!(value_after("--statistics"), "Minimum");
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let cli = CloudWatchCli::new(CloudWatchConfig {
            program: "/nonexistent/aws-cli-for-tests".to_string(),
            ..CloudWatchConfig::default()
        });
        assert!(cli.minimum_balance("i-abc").await.is_err());
    }
}

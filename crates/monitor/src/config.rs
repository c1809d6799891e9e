//! Monitor configuration
//!
//! Every setting has a compiled-in default and can be overridden with a
//! `MONITOR_`-prefixed environment variable, e.g. `MONITOR_INTERVAL_SECS`.

use anyhow::{Context, Result};
use monitor_lib::cloud::{CloudWatchConfig, DEFAULT_METADATA_URL};
use monitor_lib::collector::CpuSnapshotConfig;
use monitor_lib::credentials::{
    CredentialKind, CredentialSource, DEFAULT_LICENSE_FILE, DEFAULT_TOKEN_ENV_VAR,
};
use monitor_lib::reporter::DEFAULT_ENDPOINT;
use monitor_lib::REPORT_DURATION_SECS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Plugin API metrics endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Pause between report cycles in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Where the license key comes from: `env` or `file`
    #[serde(default)]
    pub credential_source: CredentialKind,

    /// Environment variable holding the license key
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,

    /// Configuration file holding a `license_key=` line
    #[serde(default = "default_license_file")]
    pub license_file: PathBuf,

    /// Whether to sample EC2 burst credits
    #[serde(default = "default_credit_enabled")]
    pub credit_enabled: bool,

    /// Instance metadata service base URL
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Region for the CloudWatch credit balance query
    #[serde(default = "default_aws_region")]
    pub aws_region: String,

    /// CPU snapshots averaged per reading
    #[serde(default = "default_cpu_snapshots")]
    pub cpu_snapshots: usize,

    /// Delay between CPU snapshots in milliseconds (capped below one second)
    #[serde(default = "default_cpu_snapshot_interval")]
    pub cpu_snapshot_interval_ms: u64,

    /// Ingestion request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Metadata request timeout in seconds
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// CloudWatch command timeout in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Per-sampler timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_interval() -> u64 {
    REPORT_DURATION_SECS
}

fn default_token_env_var() -> String {
    DEFAULT_TOKEN_ENV_VAR.to_string()
}

fn default_license_file() -> PathBuf {
    PathBuf::from(DEFAULT_LICENSE_FILE)
}

fn default_credit_enabled() -> bool {
    true
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_aws_region() -> String {
    "ap-southeast-2".to_string()
}

fn default_cpu_snapshots() -> usize {
    3
}

fn default_cpu_snapshot_interval() -> u64 {
    500
}

fn default_http_timeout() -> u64 {
    10
}

fn default_metadata_timeout() -> u64 {
    2
}

fn default_command_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

impl MonitorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MONITOR").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let config: MonitorConfig = config
            .try_deserialize()
            .context("Invalid MONITOR_* configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint).context("MONITOR_ENDPOINT is not a valid URL")?;
        url::Url::parse(&self.metadata_url).context("MONITOR_METADATA_URL is not a valid URL")?;
        if self.interval_secs == 0 {
            anyhow::bail!("MONITOR_INTERVAL_SECS must be greater than zero");
        }
        Ok(())
    }

    /// The configured credential strategy
    pub fn credentials(&self) -> CredentialSource {
        match self.credential_source {
            CredentialKind::Env => CredentialSource::env(&self.token_env_var),
            CredentialKind::File => CredentialSource::file(&self.license_file),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn cpu_snapshots(&self) -> CpuSnapshotConfig {
        CpuSnapshotConfig {
            snapshots: self.cpu_snapshots,
            interval: Duration::from_millis(self.cpu_snapshot_interval_ms),
        }
    }

    pub fn cloudwatch(&self) -> CloudWatchConfig {
        CloudWatchConfig {
            region: self.aws_region.clone(),
            timeout: Duration::from_secs(self.command_timeout_secs),
            ..CloudWatchConfig::default()
        }
    }

    /// Upper bound for the whole credit lookup: metadata, query and type
    pub fn credit_timeout(&self) -> Duration {
        self.metadata_timeout() * 2 + Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MonitorConfig {
        serde_json::from_str("{}").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = defaults();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.credential_source, CredentialKind::Env);
        assert_eq!(config.credentials(), CredentialSource::env("NEWRELIC_TOKEN"));
        assert!(config.credit_enabled);
        assert_eq!(config.cpu_snapshots().snapshots, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_credential_source() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"credential_source": "file", "license_file": "/tmp/nr.cfg"}"#)
                .unwrap();
        assert_eq!(config.credentials(), CredentialSource::file("/tmp/nr.cfg"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = defaults();
        config.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credit_timeout_covers_all_calls() {
        let config = defaults();
        assert_eq!(config.credit_timeout(), Duration::from_secs(34));
        assert_eq!(config.cloudwatch().region, "ap-southeast-2");
    }
}

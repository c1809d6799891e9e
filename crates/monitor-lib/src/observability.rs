//! Structured logging for the metrics reporter
//!
//! Every event carries an `event` name plus the reporting host and process
//! version, so JSON log lines can be filtered without parsing messages.

use tracing::{debug, info, warn};

/// Structured logger for reporter events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    host: String,
    version: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            version: version.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Log process startup
    pub fn log_startup(&self, credential_source: &str, interval_secs: u64, credit_enabled: bool) {
        info!(
            event = "monitor_started",
            host = %self.host,
            version = %self.version,
            credential_source = %credential_source,
            interval_secs = interval_secs,
            credit_enabled = credit_enabled,
            "newrelic-monitor started"
        );
    }

    /// Log a delivered report with its compacted payload and response status
    pub fn log_report_sent(&self, payload: &str, status: &str) {
        info!(
            event = "report_sent",
            host = %self.host,
            version = %self.version,
            status = %status,
            "{}",
            sent_line(payload, status)
        );
    }

    /// Log a report that never reached the endpoint
    pub fn log_report_failed(&self, error: &str) {
        warn!(
            event = "report_failed",
            host = %self.host,
            version = %self.version,
            error = %error,
            "Failed to send report"
        );
    }

    /// Log a sampler that fell back to zero
    pub fn log_sample_degraded(&self, metric: &str, error: &str) {
        warn!(
            event = "sample_degraded",
            host = %self.host,
            version = %self.version,
            metric = %metric,
            error = %error,
            "Sampler failed, reporting 0"
        );
    }

    /// Log per-cycle timing
    pub fn log_cycle_complete(&self, cycle: u64, delivered: bool, elapsed_ms: u128) {
        debug!(
            event = "cycle_complete",
            host = %self.host,
            cycle = cycle,
            delivered = delivered,
            elapsed_ms = elapsed_ms,
            "Report cycle complete"
        );
    }

    /// Log process shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            host = %self.host,
            version = %self.version,
            reason = %reason,
            "newrelic-monitor shutting down"
        );
    }
}

/// Single-line success message for a delivered report
pub fn sent_line(payload: &str, status: &str) -> String {
    format!("Sent: {} and received: {}", payload, status)
}

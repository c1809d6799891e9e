//! Delivery of reports to the ingestion endpoint
//!
//! Delivery is best-effort and at-most-once per cycle: a transport failure
//! is reported back to the loop and the next cycle's report supersedes it.
//! Any HTTP response counts as delivered; its body is never read.

use crate::report::Report;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Plugin API metrics endpoint
pub const DEFAULT_ENDPOINT: &str = "https://platform-api.newrelic.com/platform/v1/metrics";

/// Header carrying the license key (`X-License-Key`)
pub const LICENSE_KEY_HEADER: &str = "x-license-key";

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The endpoint answered; `status` is the status line text, e.g. `200 OK`
    Sent { payload: String, status: String },
    /// The report never reached the endpoint
    Failed { error: String },
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Destination for encoded reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(&self, report: &Report) -> Delivery;
}

/// Authenticated HTTP POST to the plugin API
pub struct HttpReporter {
    client: Client,
    endpoint: Url,
}

impl HttpReporter {
    /// Create a reporter for `endpoint` authenticated with `license_key`
    pub fn new(endpoint: &str, license_key: &str, timeout: Duration) -> Result<Self> {
        let mut key = HeaderValue::from_str(license_key)
            .context("License key is not a valid header value")?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(LICENSE_KEY_HEADER), key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = Url::parse(endpoint).context("Invalid ingestion endpoint URL")?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, payload: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .body(payload.to_string())
            .send()
            .await
            .context("Failed to send report")?;

        Ok(response.status().to_string())
    }
}

#[async_trait]
impl ReportSink for HttpReporter {
    async fn send(&self, report: &Report) -> Delivery {
        let payload = match report.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                return Delivery::Failed {
                    error: format!("{:#}", e),
                }
            }
        };

        match self.post(&payload).await {
            Ok(status) => Delivery::Sent { payload, status },
            Err(e) => Delivery::Failed {
                error: format!("{:#}", e),
            },
        }
    }
}

//! Client for the EC2 instance metadata service

use super::InstanceMetadata;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Link-local address of the metadata service
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254";

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
const INSTANCE_TYPE_PATH: &str = "/latest/meta-data/instance-type";

/// Unauthenticated metadata reader
pub struct MetadataClient {
    client: Client,
    base_url: Url,
}

impl MetadataClient {
    /// Create a new metadata client with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create metadata HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid metadata URL")?;

        Ok(Self { client, base_url })
    }

    /// Fetch a plain-text document
    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.base_url.join(path).context("Invalid metadata path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to query metadata {}", path))?;

        if !response.status().is_success() {
            anyhow::bail!("Metadata error ({}) for {}", response.status(), path);
        }

        let body = response
            .text()
            .await
            .context("Failed to read metadata response")?;

        let value = body.trim();
        if value.is_empty() {
            anyhow::bail!("Empty metadata response for {}", path);
        }
        Ok(value.to_string())
    }
}

#[async_trait]
impl InstanceMetadata for MetadataClient {
    async fn instance_id(&self) -> Result<String> {
        self.get_text(INSTANCE_ID_PATH).await
    }

    async fn instance_type(&self) -> Result<String> {
        self.get_text(INSTANCE_TYPE_PATH).await
    }
}

use async_trait::async_trait;
use importmap_core::{ImportMapError, Result};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

use crate::handler::BaseMapSource;

/// Fetches the base import map with a single GET
pub struct HttpBaseMapSource {
    client: reqwest::Client,
}

impl HttpBaseMapSource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("importmap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ImportMapError::Other(anyhow::anyhow!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BaseMapSource for HttpBaseMapSource {
    async fn fetch(&self, url: &Url) -> Result<Value> {
        let failed = |reason: String| ImportMapError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP error {}", response.status().as_u16())));
        }

        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        serde_json::from_str(&body).map_err(|source| ImportMapError::InvalidBaseMap {
            url: url.to_string(),
            source,
        })
    }
}

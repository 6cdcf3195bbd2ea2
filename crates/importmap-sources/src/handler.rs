//! Base import map source trait

use async_trait::async_trait;
use importmap_core::Result;
use reqwest::Url;
use serde_json::Value;

/// Something that can produce the base import map for a validated URL
#[async_trait]
pub trait BaseMapSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Value>;
}

/// Serves a fixed document regardless of URL. Useful offline and in tests.
#[derive(Debug, Clone)]
pub struct StaticBaseMapSource {
    document: Value,
}

impl StaticBaseMapSource {
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

#[async_trait]
impl BaseMapSource for StaticBaseMapSource {
    async fn fetch(&self, _url: &Url) -> Result<Value> {
        Ok(self.document.clone())
    }
}

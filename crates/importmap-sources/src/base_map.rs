//! Remote base import map merging
//!
//! The base map is best-effort enrichment: a malformed URL, a failed request
//! or an unparsable body is reported and the local import map is emitted
//! unchanged.

use importmap_core::manifest::merge_under;
use importmap_core::{ImportMapError, Outcome, Result};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::handler::BaseMapSource;

/// Accept only absolute `http`/`https` URLs with a host
pub fn parse_override_url(raw: &str) -> Result<Url> {
    let malformed = || ImportMapError::MalformedUrl(raw.to_string());
    let url = Url::parse(raw).map_err(|_| malformed())?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(malformed()),
    }
}

#[derive(Clone)]
pub struct OverrideMerger {
    source: Arc<dyn BaseMapSource>,
}

impl OverrideMerger {
    pub fn new(source: Arc<dyn BaseMapSource>) -> Self {
        Self { source }
    }

    /// Merge the base map at `url` underneath `local`; `local` wins every
    /// conflicting key.
    pub async fn apply(&self, url: &str, local: Value) -> Outcome<Value> {
        let url = match parse_override_url(url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Skipping base import map");
                return Outcome::with_error(local, e);
            }
        };

        match self.source.fetch(&url).await {
            Ok(base) => {
                debug!(url = %url, "Merging base import map");
                Outcome::clean(merge_under(base, local))
            }
            Err(e) => {
                warn!(error = %e, "Falling back to the local import map");
                Outcome::with_error(local, e)
            }
        }
    }
}

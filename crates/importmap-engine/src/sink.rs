//! Host output mechanisms

use importmap_core::Result;
use std::collections::BTreeMap;

/// Where the final import map is handed to the host
pub trait OutputSink: Send {
    /// Contents already present under `name`, if any
    fn existing(&self, name: &str) -> Option<String>;

    fn emit(&mut self, name: &str, contents: String) -> Result<()>;
}

/// In-memory asset table, the equivalent of a compilation's output listing
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    assets: BTreeMap<String, String>,
    emissions: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.assets.get(name).map(String::as_str)
    }

    /// Number of `emit` calls received
    pub fn emissions(&self) -> usize {
        self.emissions
    }

    pub fn assets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl OutputSink for MemorySink {
    fn existing(&self, name: &str) -> Option<String> {
        self.assets.get(name).cloned()
    }

    fn emit(&mut self, name: &str, contents: String) -> Result<()> {
        self.assets.insert(name.to_string(), contents);
        self.emissions += 1;
        Ok(())
    }
}

//! Import map serialization

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::{ImportMapError, Result};

/// Renders the final import map to text
pub trait Serializer: Send + Sync {
    fn serialize(&self, import_map: &Value) -> Result<String>;
}

impl<F> Serializer for F
where
    F: Fn(&Value) -> Result<String> + Send + Sync,
{
    fn serialize(&self, import_map: &Value) -> Result<String> {
        self(import_map)
    }
}

/// Pretty-printed JSON, four-space indent by default
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    indent: usize,
}

impl JsonSerializer {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, import_map: &Value) -> Result<String> {
        let indent = vec![b' '; self.indent];
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
        import_map.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| ImportMapError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_indent() {
        let text = JsonSerializer::default()
            .serialize(&json!({ "imports": { "one.js": "one.js" } }))
            .unwrap();
        assert_eq!(text, "{\n    \"imports\": {\n        \"one.js\": \"one.js\"\n    }\n}");
    }

    #[test]
    fn test_closure_serializer() {
        let compact = |value: &Value| -> Result<String> { Ok(value.to_string()) };
        let text = compact.serialize(&json!({ "imports": {} })).unwrap();
        assert_eq!(text, r#"{"imports":{}}"#);
    }
}

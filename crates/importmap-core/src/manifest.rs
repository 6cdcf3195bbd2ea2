//! Manifest building and merging

use serde_json::{Map, Value};

use crate::artifact::ArtifactRecord;

/// Top-level key every import map is wrapped in
pub const IMPORTS_KEY: &str = "imports";

/// Custom manifest body builder.
///
/// Receives the seed, the final artifact list and the pass's entry point
/// table. Whatever it returns becomes the manifest body; a returned object
/// with a `files` field is unwrapped to that field.
pub trait ManifestGenerator: Send + Sync {
    fn generate(
        &self,
        seed: Map<String, Value>,
        files: &[ArtifactRecord],
        entrypoints: &Map<String, Value>,
    ) -> Value;
}

impl<F> ManifestGenerator for F
where
    F: Fn(Map<String, Value>, &[ArtifactRecord], &Map<String, Value>) -> Value + Send + Sync,
{
    fn generate(
        &self,
        seed: Map<String, Value>,
        files: &[ArtifactRecord],
        entrypoints: &Map<String, Value>,
    ) -> Value {
        self(seed, files, entrypoints)
    }
}

/// Fold `name -> path` into the seed, keeping artifact order. A later
/// artifact with the same name overwrites the earlier value in place.
pub fn reduce(seed: Map<String, Value>, files: &[ArtifactRecord]) -> Map<String, Value> {
    files.iter().fold(seed, |mut manifest, file| {
        manifest.insert(file.name.clone(), Value::String(file.path.clone()));
        manifest
    })
}

/// Produce the manifest body, via `generator` when one is configured.
pub fn build_body(
    seed: Map<String, Value>,
    files: &[ArtifactRecord],
    entrypoints: &Map<String, Value>,
    generator: Option<&dyn ManifestGenerator>,
) -> Value {
    let body = match generator {
        Some(generator) => generator.generate(seed, files, entrypoints),
        None => Value::Object(reduce(seed, files)),
    };
    unwrap_files(body)
}

fn unwrap_files(body: Value) -> Value {
    match body {
        Value::Object(mut fields) if is_truthy(fields.get("files")) => {
            fields.remove("files").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => true,
    }
}

/// Wrap a manifest body as `{ "imports": body }`
pub fn wrap(body: Value) -> Value {
    let mut import_map = Map::new();
    import_map.insert(IMPORTS_KEY.to_string(), body);
    Value::Object(import_map)
}

/// Recursively merge `overlay` into `base`. Objects merge key by key and
/// arrays index by index; anything else in `overlay` replaces the value in
/// `base`. Keys already in `base` keep their position.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(entries) if base.is_object() => {
            if let Some(target) = base.as_object_mut() {
                for (key, value) in entries {
                    match target.get_mut(&key) {
                        Some(existing) => deep_merge(existing, value),
                        None => {
                            target.insert(key, value);
                        }
                    }
                }
            }
        }
        Value::Array(items) if base.is_array() => {
            if let Some(target) = base.as_array_mut() {
                for (index, value) in items.into_iter().enumerate() {
                    match target.get_mut(index) {
                        Some(existing) => deep_merge(existing, value),
                        None => target.push(value),
                    }
                }
            }
        }
        other => *base = other,
    }
}

/// `underlay` with `local` merged over it; `local` wins every conflict.
pub fn merge_under(underlay: Value, local: Value) -> Value {
    let mut merged = underlay;
    deep_merge(&mut merged, local);
    merged
}

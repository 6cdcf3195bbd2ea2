use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handle to the build unit an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    pub index: usize,
    entry_level: bool,
}

impl GroupRef {
    pub fn new(index: usize, entry_level: bool) -> Self {
        Self { index, entry_level }
    }

    /// Whether the owning unit is reachable from an entry point without an
    /// async split.
    pub fn is_entry_level(&self) -> bool {
        self.entry_level
    }
}

/// One build output, normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
    pub is_initial: bool,
    pub is_chunk: bool,
    pub is_asset: bool,
    pub is_module_asset: bool,
}

impl ArtifactRecord {
    pub fn chunk(path: impl Into<String>, name: impl Into<String>, group: GroupRef) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            group: Some(group),
            is_initial: group.is_entry_level(),
            is_chunk: true,
            is_asset: false,
            is_module_asset: false,
        }
    }

    pub fn module_asset(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            group: None,
            is_initial: false,
            is_chunk: false,
            is_asset: true,
            is_module_asset: true,
        }
    }

    pub fn asset(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            path,
            group: None,
            is_initial: false,
            is_chunk: false,
            is_asset: true,
            is_module_asset: false,
        }
    }

    /// A sibling of a chunk asset (compressed variant, source map) that maps
    /// to itself.
    pub fn related(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            path,
            group: None,
            is_initial: false,
            is_chunk: false,
            is_asset: false,
            is_module_asset: false,
        }
    }
}

/// A chunk-producing unit as reported by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildUnit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub auxiliary_files: Vec<String>,
    /// Only reachable from entry points without an async split
    #[serde(default)]
    pub initial: bool,
}

/// An emitted asset as reported by the host's asset listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Output path of the asset. Descriptors without one are ignored.
    #[serde(default)]
    pub name: Option<String>,
    /// Names of the chunks the asset belongs to
    #[serde(default)]
    pub chunks: Vec<String>,
    /// Sibling outputs recorded against this asset
    #[serde(default)]
    pub related: Vec<String>,
    /// Source file the asset was copied or emitted from, when the host knows it
    #[serde(default)]
    pub source_filename: Option<String>,
}

impl AssetDescriptor {
    pub fn is_chunk_associated(&self) -> bool {
        !self.chunks.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entrypoint {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Everything the host reports about one build pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildPass {
    #[serde(default)]
    pub units: Vec<BuildUnit>,
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
    #[serde(default)]
    pub entrypoints: Vec<Entrypoint>,
    #[serde(default)]
    pub public_path: Option<String>,
}

impl BuildPass {
    /// Entry point name → ordered output files, as handed to generators
    pub fn entrypoint_table(&self) -> Map<String, Value> {
        self.entrypoints
            .iter()
            .map(|entry| {
                let files = entry.files.iter().cloned().map(Value::String).collect();
                (entry.name.clone(), Value::Array(files))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_inherits_initial_flag() {
        let record = ArtifactRecord::chunk("one.js", "one.js", GroupRef::new(0, true));
        assert!(record.is_initial);
        assert!(record.is_chunk);
        assert!(record.group.is_some_and(|g| g.is_entry_level()));
    }

    #[test]
    fn test_pass_deserializes_with_defaults() {
        let pass: BuildPass = serde_json::from_str(
            r#"{
                "units": [{ "name": "one", "files": ["one.js"], "initial": true }],
                "entrypoints": [{ "name": "one", "files": ["one.js"] }]
            }"#,
        )
        .unwrap();

        assert_eq!(pass.units.len(), 1);
        assert!(pass.units[0].auxiliary_files.is_empty());
        assert!(pass.assets.is_empty());
        assert_eq!(
            Value::Object(pass.entrypoint_table()),
            serde_json::json!({ "one": ["one.js"] })
        );
    }
}

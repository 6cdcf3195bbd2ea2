use importmap_core::paths::{self, DEFAULT_TRANSFORM_EXTENSIONS};
use importmap_core::{ImportMapError, Outcome, PipelineOptions, Rule};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "importmap.toml";

/// Declarative import map settings, read from `importmap.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default)]
    pub base_url: Option<String>,

    /// Public path of the build, used when a pass does not carry its own
    #[serde(default)]
    pub public_path: Option<String>,

    #[serde(default = "default_transform_extensions")]
    pub transform_extensions: String,

    #[serde(default)]
    pub write_to_file_emit: bool,

    #[serde(default)]
    pub use_entry_keys: bool,

    #[serde(default)]
    pub seed: Map<String, Value>,

    /// String, `{ regex, flags }` table, or an array of those
    #[serde(default)]
    pub include: Option<Value>,

    #[serde(default)]
    pub exclude: Option<Value>,

    #[serde(default)]
    pub base_import_map: Option<String>,

    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            base_url: None,
            public_path: None,
            transform_extensions: default_transform_extensions(),
            write_to_file_emit: false,
            use_entry_keys: false,
            seed: Map::new(),
            include: None,
            exclude: None,
            base_import_map: None,
            indent: default_indent(),
        }
    }
}

fn default_file_name() -> String {
    "import-map.json".to_string()
}

fn default_transform_extensions() -> String {
    DEFAULT_TRANSFORM_EXTENSIONS.to_string()
}

fn default_indent() -> usize {
    4
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find importmap.toml by walking up from given directory
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Load the nearest importmap.toml, or the defaults if there is none
    pub fn find_and_load(start: &Path) -> anyhow::Result<Self> {
        match Self::find(start) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Build pipeline options. Rule and pattern problems are reported and the
    /// offending option degrades instead of failing the whole config.
    pub fn pipeline_options(&self) -> Outcome<PipelineOptions> {
        let mut errors = Vec::new();
        let mut options = PipelineOptions {
            base_url: self.base_url.clone(),
            use_entry_keys: self.use_entry_keys,
            seed: self.seed.clone(),
            ..Default::default()
        };

        options.include = rule("include", self.include.as_ref(), &mut errors);
        options.exclude = rule("exclude", self.exclude.as_ref(), &mut errors);

        match paths::transform_extensions(&self.transform_extensions) {
            Ok(pattern) => options.transform_extensions = pattern,
            Err(source) => errors.push(ImportMapError::InvalidPattern {
                option: "transformExtensions".to_string(),
                source,
            }),
        }

        Outcome {
            value: options,
            errors,
        }
    }
}

// "" and false mean the option is not set
fn rule(option: &str, value: Option<&Value>, errors: &mut Vec<ImportMapError>) -> Option<Rule> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        value => Some(Rule::from_value(option, value).collect_into(errors)),
    }
}

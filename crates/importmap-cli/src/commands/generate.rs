use anyhow::{Context, Result};
use importmap_config::Config;
use importmap_core::{BuildPass, ImportMapError, JsonSerializer, ModuleAssetTable, Serializer};
use importmap_engine::{AggregationContext, ImportMapPlugin, MemorySink, PluginOptions};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One build pass as written by the host
#[derive(Debug, Deserialize)]
struct PassFile {
    #[serde(flatten)]
    pass: BuildPass,
    /// Output file → request of the module that emitted it
    #[serde(default)]
    module_assets: BTreeMap<String, String>,
}

impl PassFile {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pass file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid pass description in {}", path.display()))
    }

    fn modules(&self) -> ModuleAssetTable {
        let mut modules = ModuleAssetTable::new();
        for (file, request) in &self.module_assets {
            modules.record(file, request);
        }
        modules
    }
}

pub async fn handle(
    config: Option<PathBuf>,
    output_dir: PathBuf,
    print: bool,
    passes: Vec<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::load(&path)?,
        None => Config::find_and_load(&std::env::current_dir()?)?,
    };

    // Read everything up front so a bad file does not leave passes outstanding
    let pass_files = passes
        .iter()
        .map(|path| PassFile::read(path))
        .collect::<Result<Vec<_>>>()?;

    let import_map = generate(&config, &output_dir, pass_files).await?;

    if print {
        println!("{}", JsonSerializer::new(config.indent).serialize(&import_map)?);
    }
    Ok(())
}

async fn generate(config: &Config, output_dir: &Path, pass_files: Vec<PassFile>) -> Result<Value> {
    let (pipeline, config_errors) = config.pipeline_options().into_parts();
    for error in &config_errors {
        warn!("{}", error);
    }

    let options = PluginOptions {
        pipeline,
        file_name: config.file_name.clone(),
        write_to_file_emit: true,
        serializer: Arc::new(JsonSerializer::new(config.indent)),
        base_import_map: config.base_import_map.clone(),
    };
    let context = Arc::new(AggregationContext::new());
    let plugin = ImportMapPlugin::new(options, output_dir, context)?;

    let tickets: Vec<_> = pass_files.iter().map(|_| plugin.begin_pass()).collect();
    let mut sink = MemorySink::new();
    let mut import_map = Value::Null;

    for (ticket, mut file) in tickets.into_iter().zip(pass_files) {
        let modules = file.modules();
        if file.pass.public_path.is_none() {
            file.pass.public_path = config.public_path.clone();
        }

        let report = plugin
            .complete_pass(ticket, &file.pass, &modules, &mut sink)
            .await;
        let mut write_error = None;
        for error in report.errors {
            match error {
                // Writing the file is the whole point here
                ImportMapError::Io(e) => write_error = Some(e),
                other => warn!("{}", other),
            }
        }
        if let Some(e) = write_error {
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to write {}",
                plugin.output_file().display()
            )));
        }
        if report.is_final {
            import_map = report.import_map;
        }
    }

    info!(path = %plugin.output_file().display(), "Import map written");
    Ok(import_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn pass_file(value: Value) -> PassFile {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_generate_combines_passes_and_writes_once() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            public_path: Some("/static/".to_string()),
            ..Default::default()
        };
        let passes = vec![
            pass_file(json!({
                "units": [{ "name": "one", "files": ["one.abc.js"], "initial": true }]
            })),
            pass_file(json!({
                "units": [{ "name": "two", "files": ["two.def.js"], "initial": true }],
                "public_path": "/other/"
            })),
        ];

        let import_map = generate(&config, dir.path(), passes).await.unwrap();

        let expected = json!({ "imports": {
            "one.js": "/static/one.abc.js",
            "two.js": "/other/two.def.js"
        } });
        assert_eq!(import_map, expected);
        let written = std::fs::read_to_string(dir.path().join("import-map.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_generate_records_module_assets() {
        let dir = TempDir::new().unwrap();
        let passes = vec![pass_file(json!({
            "assets": [{ "name": "media/logo.1a2b.svg" }],
            "module_assets": { "media/logo.1a2b.svg": "./src/images/logo.svg" }
        }))];

        let import_map = generate(&Config::default(), dir.path(), passes)
            .await
            .unwrap();

        assert_eq!(
            import_map,
            json!({ "imports": { "media/logo.svg": "media/logo.1a2b.svg" } })
        );
    }

    #[tokio::test]
    async fn test_generate_honors_indent_and_file_name() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            file_name: "maps/app.json".to_string(),
            indent: 2,
            ..Default::default()
        };
        let passes = vec![pass_file(json!({
            "units": [{ "name": "main", "files": ["main.js"], "initial": true }]
        }))];

        generate(&config, dir.path(), passes).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("maps/app.json")).unwrap();
        assert_eq!(written, "{\n  \"imports\": {\n    \"main.js\": \"main.js\"\n  }\n}");
    }

    #[tokio::test]
    async fn test_generate_fails_when_file_cannot_be_written() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("maps"), "").unwrap();
        let config = Config {
            file_name: "maps/import-map.json".to_string(),
            ..Default::default()
        };
        let passes = vec![pass_file(json!({
            "units": [{ "name": "main", "files": ["main.js"], "initial": true }]
        }))];

        let error = generate(&config, dir.path(), passes).await.unwrap_err();

        assert!(error.to_string().starts_with("Failed to write"));
    }
}

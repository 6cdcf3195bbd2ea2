//! Import map generation across build passes
//!
//! [`ImportMapPlugin`] is what a host drives: it calls
//! [`ImportMapPlugin::begin_pass`] when a build pass starts and
//! [`ImportMapPlugin::complete_pass`] once the pass's outputs are known. Only
//! the final pass for an output target merges, serializes and emits.

pub mod aggregate;
pub mod hooks;
pub mod sink;

pub use aggregate::{AggregationContext, Completion, PassTicket};
pub use hooks::EmitHooks;
pub use sink::{MemorySink, OutputSink};

use importmap_core::manifest::deep_merge;
use importmap_core::paths::standardize;
use importmap_core::{
    BuildPass, ImportMapError, JsonSerializer, ModuleAssetTable, Pipeline, PipelineOptions,
    Result, Serializer,
};
use importmap_sources::{BaseMapSource, HttpBaseMapSource, OverrideMerger};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_FILE_NAME: &str = "import-map.json";

#[derive(Clone)]
pub struct PluginOptions {
    pub pipeline: PipelineOptions,
    /// Output location, relative to the output directory unless absolute
    pub file_name: String,
    /// Also write the result to disk at the resolved output location
    pub write_to_file_emit: bool,
    pub serializer: Arc<dyn Serializer>,
    /// URL of a base import map merged underneath the result
    pub base_import_map: Option<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            pipeline: PipelineOptions::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            write_to_file_emit: false,
            serializer: Arc::new(JsonSerializer::default()),
            base_import_map: None,
        }
    }
}

/// What happened to one pass
#[derive(Debug)]
pub struct PassReport {
    /// The pass's import map; for the final pass, the emitted one
    pub import_map: Value,
    pub is_final: bool,
    /// Passes still outstanding for the target after this one
    pub remaining: usize,
    /// Everything reported along the way; none of it stopped the pass
    pub errors: Vec<ImportMapError>,
}

pub struct ImportMapPlugin {
    pipeline: Pipeline,
    options: PluginOptions,
    output_dir: PathBuf,
    output_file: PathBuf,
    output_name: String,
    context: Arc<AggregationContext>,
    merger: OverrideMerger,
    hooks: EmitHooks,
}

impl ImportMapPlugin {
    pub fn new(
        options: PluginOptions,
        output_dir: impl Into<PathBuf>,
        context: Arc<AggregationContext>,
    ) -> Result<Self> {
        let source = Arc::new(HttpBaseMapSource::new()?);
        Ok(Self::with_base_source(options, output_dir, context, source))
    }

    pub fn with_base_source(
        options: PluginOptions,
        output_dir: impl Into<PathBuf>,
        context: Arc<AggregationContext>,
        source: Arc<dyn BaseMapSource>,
    ) -> Self {
        let output_dir = resolve(&output_dir.into());
        let output_file = resolve(&output_dir.join(&options.file_name));
        let output_name = output_name(&output_dir, &output_file);

        Self {
            pipeline: Pipeline::new(options.pipeline.clone()),
            options,
            output_dir,
            output_file,
            output_name,
            context,
            merger: OverrideMerger::new(source),
            hooks: EmitHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: EmitHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Resolved output target, the identity passes are counted under
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Name the import map is emitted under
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Covers fresh builds and rebuilds alike
    pub fn begin_pass(&self) -> PassTicket {
        let ticket = self.context.begin_pass(self.output_file.clone());
        debug!(
            target = %self.output_file.display(),
            outstanding = self.context.outstanding(&self.output_file),
            "Build pass started"
        );
        ticket
    }

    pub async fn complete_pass(
        &self,
        ticket: PassTicket,
        pass: &BuildPass,
        modules: &ModuleAssetTable,
        sink: &mut dyn OutputSink,
    ) -> PassReport {
        let mut errors = Vec::new();

        let is_manifest =
            |name: &str| self.context.is_tracked(&resolve(&self.output_dir.join(name)));
        let computed = self.pipeline.run(pass, modules, &is_manifest);
        debug!(files = computed.files.len(), "Pipeline finished");

        let import_map = self.hooks.before_emit(computed.import_map);

        let completion = match self.context.complete_pass(ticket, import_map.clone()) {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, "Pass completion rejected");
                errors.push(e);
                Completion::Pending { remaining: 0 }
            }
        };

        let report = match completion {
            Completion::Pending { remaining } => {
                debug!(remaining, "Waiting for other passes before emitting");
                PassReport {
                    import_map,
                    is_final: false,
                    remaining,
                    errors,
                }
            }
            Completion::Final {
                contributions,
                cycle,
            } => {
                let import_map = self
                    .finalize(import_map, contributions, cycle, sink, &mut errors)
                    .await;
                PassReport {
                    import_map,
                    is_final: true,
                    remaining: 0,
                    errors,
                }
            }
        };

        self.hooks.after_emit(&report.import_map);
        report
    }

    async fn finalize(
        &self,
        local: Value,
        contributions: Vec<Value>,
        cycle: usize,
        sink: &mut dyn OutputSink,
        errors: &mut Vec<ImportMapError>,
    ) -> Value {
        let mut merged = Value::Object(Map::new());
        // Later cycles rebuild from scratch; what sits in the sink then is our
        // own previous emission, already merged with an older base map.
        let previous = if cycle == 0 {
            sink.existing(&self.output_name)
        } else {
            None
        };
        if let Some(previous) = previous {
            match serde_json::from_str(&previous) {
                Ok(previous) => deep_merge(&mut merged, previous),
                Err(source) => {
                    let e = ImportMapError::InvalidPriorOutput {
                        name: self.output_name.clone(),
                        source,
                    };
                    warn!(error = %e, "Ignoring previous output");
                    errors.push(e);
                }
            }
        }
        for contribution in contributions {
            deep_merge(&mut merged, contribution);
        }
        deep_merge(&mut merged, local);

        if let Some(url) = &self.options.base_import_map {
            merged = self.merger.apply(url, merged).await.collect_into(errors);
        }

        match self.emit(&merged, sink) {
            Ok(output) if self.options.write_to_file_emit => {
                if let Err(e) = self.write_to_disk(output).await {
                    warn!(error = %e, path = %self.output_file.display(), "Import map was not written to disk");
                    errors.push(e);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Import map was not emitted");
                errors.push(e);
            }
        }
        merged
    }

    /// Hand the serialized import map to the sink, returning what was emitted
    fn emit(&self, import_map: &Value, sink: &mut dyn OutputSink) -> Result<String> {
        let output = self.options.serializer.serialize(import_map)?;
        sink.emit(&self.output_name, output.clone())?;
        info!(name = %self.output_name, "Emitted import map");
        Ok(output)
    }

    async fn write_to_disk(&self, output: String) -> Result<()> {
        if let Some(parent) = self.output_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.output_file, output).await?;
        debug!(path = %self.output_file.display(), "Wrote import map to disk");
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` removed lexically
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    resolved.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_)) | None
                ) {
                    resolved.pop();
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

fn output_name(output_dir: &Path, output_file: &Path) -> String {
    let relative = output_file.strip_prefix(output_dir).unwrap_or(output_file);
    standardize(&relative.to_string_lossy())
}

//! Artifact normalization
//!
//! Turns the host's view of a pass (chunk-producing units plus the asset
//! listing) into a flat list of [`ArtifactRecord`]s.

use regex::Regex;
use std::collections::HashMap;

use crate::artifact::{ArtifactRecord, AssetDescriptor, BuildPass, BuildUnit, GroupRef};
use crate::paths;

/// Logical names of assets emitted by loaders, keyed by output path.
///
/// Filled incrementally while the host builds; only the first name recorded
/// for a file is kept.
#[derive(Debug, Clone, Default)]
pub struct ModuleAssetTable {
    names: HashMap<String, String>,
}

impl ModuleAssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` was emitted while processing the module requested
    /// as `user_request`. The logical name keeps the emitted file's directory
    /// and takes the requested module's file name.
    pub fn record(&mut self, file: &str, user_request: &str) -> bool {
        if user_request.is_empty() || self.names.contains_key(file) {
            return false;
        }
        let base = user_request
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(user_request);
        let name = match file.rfind(['/', '\\']) {
            Some(split) => format!("{}/{}", &file[..split], base),
            None => base.to_string(),
        };
        self.names.insert(file.to_string(), name);
        true
    }

    pub fn insert(&mut self, file: impl Into<String>, name: impl Into<String>) {
        self.names.insert(file.into(), name.into());
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.names.get(file).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub transform_extensions: Regex,
    /// Key named units by their bare name (source maps keep the extension)
    pub use_entry_keys: bool,
}

pub fn normalize(
    pass: &BuildPass,
    modules: &ModuleAssetTable,
    options: &NormalizeOptions,
) -> Vec<ArtifactRecord> {
    let mut files = Vec::new();
    for (index, unit) in pass.units.iter().enumerate() {
        unit_records(unit, GroupRef::new(index, unit.initial), options, &mut files);
    }
    for asset in &pass.assets {
        asset_records(asset, modules, &mut files);
    }
    files
}

fn unit_records(
    unit: &BuildUnit,
    group: GroupRef,
    options: &NormalizeOptions,
    files: &mut Vec<ArtifactRecord>,
) {
    let unit_name = unit.name.as_deref().filter(|name| !name.is_empty());

    for path in unit.files.iter().chain(&unit.auxiliary_files) {
        if path.is_empty() {
            continue;
        }
        let name = match unit_name {
            Some(name) if options.use_entry_keys && !path.ends_with(".map") => name.to_string(),
            Some(name) => format!(
                "{}.{}",
                name,
                paths::file_type(path, &options.transform_extensions)
            ),
            None => path.clone(),
        };
        files.push(ArtifactRecord::chunk(path.clone(), name, group));
    }
}

fn asset_records(
    asset: &AssetDescriptor,
    modules: &ModuleAssetTable,
    files: &mut Vec<ArtifactRecord>,
) {
    let Some(path) = asset.name.as_deref().filter(|path| !path.is_empty()) else {
        return;
    };

    let logical_name = modules.get(path).or_else(|| {
        asset
            .source_filename
            .as_deref()
            .filter(|source| !source.is_empty())
    });
    if let Some(name) = logical_name {
        files.push(ArtifactRecord::module_asset(path, name));
        return;
    }

    if asset.is_chunk_associated() {
        // The chunk itself is already listed through its unit
        files.extend(
            asset
                .related
                .iter()
                .filter(|related| !related.is_empty())
                .map(|related| ArtifactRecord::related(related.clone())),
        );
        return;
    }

    files.push(ArtifactRecord::asset(path));
}

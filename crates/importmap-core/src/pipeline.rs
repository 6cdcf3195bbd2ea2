//! Per-pass manifest pipeline
//!
//! Stage order: normalize, drop hot updates and foreign manifests,
//! include/exclude, custom filter, rename keys and values, prefix, standardize
//! separators, map, sort, build. Every stage is synchronous and pure apart
//! from the user-supplied strategies.

use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::artifact::{ArtifactRecord, BuildPass};
use crate::manifest::{self, ManifestGenerator};
use crate::normalize::{self, ModuleAssetTable, NormalizeOptions};
use crate::paths;
use crate::rules::Rule;

/// Rename strategy. Returning `None` (or an empty string) keeps the value.
pub type RenameFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
pub type FilterFn = Arc<dyn Fn(&ArtifactRecord) -> bool + Send + Sync>;
/// Receives each record with its position after filtering
pub type MapFn = Arc<dyn Fn(ArtifactRecord, usize) -> ArtifactRecord + Send + Sync>;
pub type SortFn = Arc<dyn Fn(&ArtifactRecord, &ArtifactRecord) -> Ordering + Send + Sync>;

/// Public path value meaning "decide at runtime"; treated as no prefix
pub const AUTO_PUBLIC_PATH: &str = "auto";

#[derive(Clone)]
pub struct PipelineOptions {
    pub include: Option<Rule>,
    pub exclude: Option<Rule>,
    pub filter: Option<FilterFn>,
    pub transform_keys: Option<RenameFn>,
    pub transform_values: Option<RenameFn>,
    /// Overrides the host's public path when set, even to ""
    pub base_url: Option<String>,
    pub transform_extensions: Regex,
    pub use_entry_keys: bool,
    pub seed: Map<String, Value>,
    pub map: Option<MapFn>,
    pub sort: Option<SortFn>,
    pub generate: Option<Arc<dyn ManifestGenerator>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include: None,
            exclude: None,
            filter: None,
            transform_keys: None,
            transform_values: None,
            base_url: None,
            transform_extensions: paths::transform_extensions(paths::DEFAULT_TRANSFORM_EXTENSIONS)
                .expect("default transform extensions compile"),
            use_entry_keys: false,
            seed: Map::new(),
            map: None,
            sort: None,
            generate: None,
        }
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("filter", &self.filter.is_some())
            .field("transform_keys", &self.transform_keys.is_some())
            .field("transform_values", &self.transform_values.is_some())
            .field("base_url", &self.base_url)
            .field("transform_extensions", &self.transform_extensions.as_str())
            .field("use_entry_keys", &self.use_entry_keys)
            .field("seed", &self.seed)
            .field("map", &self.map.is_some())
            .field("sort", &self.sort.is_some())
            .field("generate", &self.generate.is_some())
            .finish()
    }
}

/// Result of running one pass through the pipeline
#[derive(Debug, Clone)]
pub struct PassManifest {
    /// Records as they were folded into the manifest
    pub files: Vec<ArtifactRecord>,
    /// `{ "imports": ... }`
    pub import_map: Value,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage for one pass.
    ///
    /// `is_manifest` reports artifact names that are themselves import maps
    /// tracked by the caller; those never become entries.
    pub fn run(
        &self,
        pass: &BuildPass,
        modules: &ModuleAssetTable,
        is_manifest: &dyn Fn(&str) -> bool,
    ) -> PassManifest {
        let options = &self.options;
        let normalize_options = NormalizeOptions {
            transform_extensions: options.transform_extensions.clone(),
            use_entry_keys: options.use_entry_keys,
        };

        let mut files = normalize::normalize(pass, modules, &normalize_options);
        files.retain(|file| !file.path.contains("hot-update") && !is_manifest(&file.name));

        files = apply_rules(files, options.include.as_ref(), options.exclude.as_ref());
        if let Some(filter) = &options.filter {
            files.retain(|file| filter(file));
        }

        rename(
            &mut files,
            options.transform_keys.as_ref(),
            options.transform_values.as_ref(),
        );
        let base = resolve_base(options.base_url.as_deref(), pass.public_path.as_deref());
        prefix(&mut files, &base);
        standardize_all(&mut files);

        if let Some(map) = &options.map {
            files = files
                .into_iter()
                .enumerate()
                .map(|(index, file)| map(file, index))
                .collect();
        }
        if let Some(sort) = &options.sort {
            files.sort_by(|a, b| sort(a, b));
        }

        let body = manifest::build_body(
            options.seed.clone(),
            &files,
            &pass.entrypoint_table(),
            options.generate.as_deref(),
        );

        PassManifest {
            files,
            import_map: manifest::wrap(body),
        }
    }
}

/// Keep names matching `include` (when set), then drop names matching
/// `exclude` (when set).
pub fn apply_rules(
    files: Vec<ArtifactRecord>,
    include: Option<&Rule>,
    exclude: Option<&Rule>,
) -> Vec<ArtifactRecord> {
    files
        .into_iter()
        .filter(|file| include.is_none_or(|rule| rule.matches(&file.name)))
        .filter(|file| !exclude.is_some_and(|rule| rule.matches(&file.name)))
        .collect()
}

pub fn rename(
    files: &mut [ArtifactRecord],
    keys: Option<&RenameFn>,
    values: Option<&RenameFn>,
) {
    for file in files.iter_mut() {
        if let Some(renamed) = keys.and_then(|f| f(&file.name)).filter(|s| !s.is_empty()) {
            file.name = renamed;
        }
        if let Some(renamed) = values.and_then(|f| f(&file.path)).filter(|s| !s.is_empty()) {
            file.path = renamed;
        }
    }
}

/// Effective prefix: the explicit base URL, else the host's public path
/// (unless it is `auto`), else nothing.
pub fn resolve_base(base_url: Option<&str>, public_path: Option<&str>) -> String {
    match (base_url, public_path) {
        (Some(base), _) => base.to_string(),
        (None, Some(public)) if public != AUTO_PUBLIC_PATH => public.to_string(),
        _ => String::new(),
    }
}

/// Prefix every path with `base`, leaving complete URLs untouched.
pub fn prefix(files: &mut [ArtifactRecord], base: &str) {
    if base.is_empty() {
        return;
    }
    for file in files.iter_mut() {
        if !paths::is_full_url(&file.path) {
            file.path = paths::join_base(base, &file.path);
        }
    }
}

pub fn standardize_all(files: &mut [ArtifactRecord]) {
    for file in files.iter_mut() {
        file.name = paths::standardize(&file.name);
        file.path = paths::standardize(&file.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{AssetDescriptor, BuildUnit, Entrypoint};
    use serde_json::json;

    fn pass(entries: &[(&str, &str)]) -> BuildPass {
        BuildPass {
            units: entries
                .iter()
                .map(|(name, file)| BuildUnit {
                    name: Some(name.to_string()),
                    files: vec![file.to_string()],
                    initial: true,
                    ..Default::default()
                })
                .collect(),
            entrypoints: entries
                .iter()
                .map(|(name, file)| Entrypoint {
                    name: name.to_string(),
                    files: vec![file.to_string()],
                })
                .collect(),
            ..Default::default()
        }
    }

    fn run(options: PipelineOptions, pass: &BuildPass) -> Value {
        Pipeline::new(options)
            .run(pass, &ModuleAssetTable::new(), &|_| false)
            .import_map
    }

    #[test]
    fn test_single_entry() {
        let manifest = run(PipelineOptions::default(), &pass(&[("one", "one.js")]));
        assert_eq!(manifest, json!({ "imports": { "one.js": "one.js" } }));
    }

    #[test]
    fn test_include_mixed_rules() {
        let options = PipelineOptions {
            include: Some(Rule::AnyOf(vec![
                Rule::from("one.js"),
                Rule::pattern("two").unwrap(),
            ])),
            ..Default::default()
        };
        let manifest = run(options, &pass(&[("one", "one.js"), ("two", "two.js")]));
        assert_eq!(
            manifest,
            json!({ "imports": { "one.js": "one.js", "two.js": "two.js" } })
        );
    }

    #[test]
    fn test_exclude_mixed_rules() {
        let options = PipelineOptions {
            exclude: Some(Rule::AnyOf(vec![
                Rule::from("one.js"),
                Rule::pattern("two").unwrap(),
            ])),
            ..Default::default()
        };
        let manifest = run(options, &pass(&[("one", "one.js"), ("two", "two.js")]));
        assert_eq!(manifest, json!({ "imports": {} }));
    }

    #[test]
    fn test_base_url_prefix() {
        let options = PipelineOptions {
            base_url: Some("/app/".to_string()),
            ..Default::default()
        };
        let manifest = run(options, &pass(&[("one", "one.abc123.js")]));
        assert_eq!(manifest, json!({ "imports": { "one.js": "/app/one.abc123.js" } }));
    }

    #[test]
    fn test_base_url_overrides_public_path_and_skips_seed() {
        let mut seed = Map::new();
        seed.insert("test1".to_string(), json!("test2"));
        let options = PipelineOptions {
            base_url: Some("/foo/".to_string()),
            seed,
            ..Default::default()
        };
        let mut build = pass(&[("one", "one.js")]);
        build.public_path = Some("/not-foo/".to_string());

        let manifest = run(options, &build);

        assert_eq!(
            manifest,
            json!({ "imports": { "test1": "test2", "one.js": "/foo/one.js" } })
        );
    }

    #[test]
    fn test_auto_public_path_is_ignored() {
        let mut build = pass(&[("one", "one.js")]);
        build.public_path = Some("auto".to_string());
        let manifest = run(PipelineOptions::default(), &build);
        assert_eq!(manifest, json!({ "imports": { "one.js": "one.js" } }));
    }

    #[test]
    fn test_full_urls_are_never_prefixed() {
        let mut files = vec![
            ArtifactRecord::asset("https://cdn.example.com/third.party.js"),
            ArtifactRecord::asset("local.js"),
        ];
        prefix(&mut files, "http://www.example.com/app/");
        assert_eq!(files[0].path, "https://cdn.example.com/third.party.js");
        assert_eq!(files[1].path, "http://www.example.com/app/local.js");
    }

    #[test]
    fn test_rename_falsy_means_unchanged() {
        let keys: RenameFn = Arc::new(|name: &str| Some(format!("zzz/{name}")));
        let values: RenameFn = Arc::new(|_: &str| Some(String::new()));
        let options = PipelineOptions {
            transform_keys: Some(keys),
            transform_values: Some(values),
            ..Default::default()
        };
        let mut build = pass(&[("one", "one.js")]);
        build.public_path = Some("/app/".to_string());

        let manifest = run(options, &build);

        assert_eq!(manifest, json!({ "imports": { "zzz/one.js": "/app/one.js" } }));
    }

    #[test]
    fn test_unix_paths() {
        let manifest = run(
            PipelineOptions::default(),
            &pass(&[(r"dir\main", r"dir\main.js"), (r"some\dir\main", r"some\dir\main.js")]),
        );
        assert_eq!(
            manifest,
            json!({ "imports": {
                "dir/main.js": "dir/main.js",
                "some/dir/main.js": "some/dir/main.js"
            } })
        );
    }

    #[test]
    fn test_filter_and_sort() {
        let filter: FilterFn = Arc::new(|file: &ArtifactRecord| file.is_initial);
        let sort: SortFn = Arc::new(|a: &ArtifactRecord, b: &ArtifactRecord| {
            b.name.cmp(&a.name)
        });
        let mut build = pass(&[("one", "one.js"), ("two", "two.js")]);
        build.units.push(BuildUnit {
            name: None,
            files: vec!["1.async.js".to_string()],
            initial: false,
            ..Default::default()
        });
        let options = PipelineOptions {
            filter: Some(filter),
            sort: Some(sort),
            ..Default::default()
        };

        let manifest = run(options, &build);

        let keys: Vec<&String> = manifest["imports"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["two.js", "one.js"]);
    }

    #[test]
    fn test_map_receives_index() {
        let map: MapFn = Arc::new(|mut file: ArtifactRecord, index: usize| {
            file.name = index.to_string();
            file
        });
        let options = PipelineOptions {
            map: Some(map),
            ..Default::default()
        };
        let manifest = run(options, &pass(&[("main", "main.js")]));
        assert_eq!(manifest, json!({ "imports": { "0": "main.js" } }));
    }

    #[test]
    fn test_hot_updates_and_tracked_manifests_dropped() {
        let mut build = pass(&[("main", "main.js")]);
        build.assets = vec![
            AssetDescriptor {
                name: Some("main.1a2b.hot-update.js".to_string()),
                ..Default::default()
            },
            AssetDescriptor {
                name: Some("import-map.json".to_string()),
                ..Default::default()
            },
        ];

        let result = Pipeline::new(PipelineOptions::default()).run(
            &build,
            &ModuleAssetTable::new(),
            &|name| name == "import-map.json",
        );

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.import_map, json!({ "imports": { "main.js": "main.js" } }));
    }
}

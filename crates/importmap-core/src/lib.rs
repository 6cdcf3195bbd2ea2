//! Core model and pipeline for import map generation
//!
//! This crate contains:
//! - Artifact records and the host's pass description
//! - The per-pass pipeline (normalize, filter, rename, prefix, sort, build)
//! - Manifest merging and serialization

pub mod artifact;
pub mod error;
pub mod manifest;
pub mod normalize;
pub mod outcome;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod rules;

pub use artifact::{ArtifactRecord, AssetDescriptor, BuildPass, BuildUnit, Entrypoint, GroupRef};
pub use error::{ImportMapError, Result};
pub use manifest::ManifestGenerator;
pub use normalize::ModuleAssetTable;
pub use outcome::Outcome;
pub use pipeline::{PassManifest, Pipeline, PipelineOptions};
pub use render::{JsonSerializer, Serializer};
pub use rules::Rule;

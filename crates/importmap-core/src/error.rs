use thiserror::Error;

/// Prefix carried by every reported message so hosts can pick them out of a
/// shared error channel.
pub const REPORT_PREFIX: &str = "[import-map]";

#[derive(Error, Debug)]
pub enum ImportMapError {
    #[error("[import-map] Unsupported type provided for {option} option: {detail}")]
    UnsupportedRule { option: String, detail: String },

    #[error("[import-map] Invalid regular expression for {option} option: {source}")]
    InvalidPattern {
        option: String,
        #[source]
        source: regex::Error,
    },

    #[error("[import-map] Malformed URL for baseImportMap (URL must include protocol): {0}")]
    MalformedUrl(String),

    #[error("[import-map] Unable to download the base import-map from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("[import-map] Base import-map from {url} is not valid JSON: {source}")]
    InvalidBaseMap {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("[import-map] Previously emitted {name} could not be merged: {source}")]
    InvalidPriorOutput {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("[import-map] Pass {0} was completed without a matching start")]
    UnknownPass(String),

    #[error("[import-map] Serializer failed: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ImportMapError>;

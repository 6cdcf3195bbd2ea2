//! Base import map sources and the override merger

pub mod base_map;
pub mod handler;
pub mod url;

pub use base_map::{OverrideMerger, parse_override_url};
pub use handler::{BaseMapSource, StaticBaseMapSource};
pub use url::HttpBaseMapSource;

//! Path helpers: separator normalization, extension detection, URL shape
//! checks and base-location joining.

use regex::Regex;
use std::sync::LazyLock;

static FULL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(https?://)",
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|",
        r"((\d{1,3}\.){3}\d{1,3}))",
        r"(:\d+)?(/[-a-z\d%_.~+]*)*",
        r"(\?[;&a-z\d%_.~+=-]*)?",
        r"(#[-a-z\d_]*)?$",
    ))
    .expect("full URL pattern compiles")
});

/// Default for `transform_extensions`
pub const DEFAULT_TRANSFORM_EXTENSIONS: &str = "^(gz|map)$";

/// Build the transform-extension matcher. Matching is case-insensitive.
pub fn transform_extensions(pattern: &str) -> Result<Regex, regex::Error> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
}

/// Replace backslashes with forward slashes
pub fn standardize(value: &str) -> String {
    value.replace('\\', "/")
}

/// Extension of an output file, ignoring any query string. Extensions matched
/// by `transform` are reported together with the segment before them, so
/// `bundle.js.map` yields `js.map`.
pub fn file_type(file: &str, transform: &Regex) -> String {
    let file = file.split_once('?').map_or(file, |(head, _)| head);
    let mut segments = file.rsplit('.');
    let ext = segments.next().unwrap_or_default();

    if transform.is_match(ext) {
        if let Some(owner) = segments.next() {
            return format!("{owner}.{ext}");
        }
    }
    ext.to_string()
}

/// Whether `path` is already a complete `http(s)://` URL
pub fn is_full_url(path: &str) -> bool {
    FULL_URL.is_match(path)
}

/// Join a base location and a path with exactly one slash between them
pub fn join_base(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_transform() -> Regex {
        transform_extensions(DEFAULT_TRANSFORM_EXTENSIONS).unwrap()
    }

    #[test]
    fn test_file_type_plain_and_compound() {
        let transform = default_transform();
        assert_eq!(file_type("bundle.js", &transform), "js");
        assert_eq!(file_type("bundle.js.map", &transform), "js.map");
        assert_eq!(file_type("bundle.css.GZ", &transform), "css.GZ");
        assert_eq!(file_type("one.abc123.js?v=3.1", &transform), "js");
    }

    #[test]
    fn test_file_type_without_owner_segment() {
        let transform = default_transform();
        assert_eq!(file_type("map", &transform), "map");
        assert_eq!(file_type("README", &transform), "README");
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let once = standardize(r"some\dir\main.js");
        assert_eq!(once, "some/dir/main.js");
        assert!(!once.contains('\\'));
        assert_eq!(standardize(&once), once);
    }

    #[test]
    fn test_full_url_shapes() {
        assert!(is_full_url("https://cdn.example.com/lib/react.js"));
        assert!(is_full_url("http://127.0.0.1:8080/a.js?x=1#top"));
        assert!(!is_full_url("/app/one.js"));
        assert!(!is_full_url("one.js"));
        assert!(!is_full_url("ftp://example.com/one.js"));
    }

    #[test]
    fn test_join_base_single_slash() {
        assert_eq!(join_base("/app/", "one.abc123.js"), "/app/one.abc123.js");
        assert_eq!(join_base("/app", "one.js"), "/app/one.js");
        assert_eq!(join_base("/app/", "/one.js"), "/app/one.js");
        assert_eq!(join_base("/app", "/one.js"), "/app/one.js");
    }
}

//! Extension to content-type lookup.
//!
//! The table is defined as JSON mapping each content type to its file
//! extensions and inverted once at startup.

use std::collections::{BTreeMap, HashMap};

/// Built-in type definitions.
const BUILTIN_TYPES: &str = include_str!("types.json");

/// Content type for unknown extensions.
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Read-only mapping from lowercased extension to content type.
#[derive(Debug, Clone)]
pub(crate) struct MimeTable {
    by_extension: HashMap<String, String>,
}

impl MimeTable {
    /// Build a table from `{ "<type>": ["ext", ...] }` JSON.
    ///
    /// When an extension is listed under several types, the type that sorts
    /// last wins.
    pub(crate) fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let types: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;

        let by_extension = types
            .into_iter()
            .flat_map(|(content_type, extensions)| {
                extensions
                    .into_iter()
                    .map(move |ext| (ext.to_lowercase(), content_type.clone()))
            })
            .collect();

        Ok(Self { by_extension })
    }

    /// Table compiled into the binary.
    pub(crate) fn builtin() -> Self {
        Self::from_json(BUILTIN_TYPES).expect("built-in types.json is valid")
    }

    /// Content type for an extension (without the dot).
    pub(crate) fn get(&self, extension: &str) -> Option<&str> {
        self.by_extension
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }

    /// Content type for a resource path, by the text after its last `.`,
    /// `/` or `\`.
    pub(crate) fn content_type_for(&self, path: &str) -> &str {
        let extension = path.rsplit(['.', '/', '\\']).next().unwrap_or_default();
        self.get(extension).unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_known_types() {
        let table = MimeTable::builtin();
        assert_eq!(table.get("css"), Some("text/css"));
        assert_eq!(table.get("html"), Some("text/html"));
        assert_eq!(table.get("js"), Some("application/javascript"));
        assert_eq!(table.get("png"), Some("image/png"));
        assert_eq!(table.get("svg"), Some("image/svg+xml"));
        assert_eq!(table.get("woff2"), Some("font/woff2"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = MimeTable::builtin();
        assert_eq!(table.get("PNG"), Some("image/png"));
        assert_eq!(table.content_type_for("/img/LOGO.JPG"), "image/jpeg");
    }

    #[test]
    fn test_content_type_for_paths() {
        let table = MimeTable::builtin();
        assert_eq!(table.content_type_for("/style.css"), "text/css");
        assert_eq!(table.content_type_for("/a.b/app.min.js"), "application/javascript");
        assert_eq!(table.content_type_for("/index.html"), "text/html");
    }

    #[test]
    fn test_content_type_for_unknown() {
        let table = MimeTable::builtin();
        assert_eq!(table.content_type_for("/file.unknown_ext_xyz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(table.content_type_for("/Makefile"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_from_json_inverts_mapping() {
        let table =
            MimeTable::from_json(r#"{"text/x-custom": ["Foo", "bar"], "image/x-thing": ["thg"]}"#)
                .unwrap();
        assert_eq!(table.get("foo"), Some("text/x-custom"));
        assert_eq!(table.get("bar"), Some("text/x-custom"));
        assert_eq!(table.get("thg"), Some("image/x-thing"));
        assert_eq!(table.get("css"), None);
    }

    #[test]
    fn test_from_json_duplicate_extension_last_type_wins() {
        let table = MimeTable::from_json(r#"{"b/type": ["x"], "a/type": ["x"]}"#).unwrap();
        assert_eq!(table.get("x"), Some("b/type"));
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(MimeTable::from_json("[1, 2]").is_err());
    }
}

//! Content-type resolution keyed on file extension
//!
//! A plain lookup table, externally extensible. Unknown extensions resolve
//! to `None`, which becomes an attachment without a content type.

use std::collections::BTreeMap;

/// Extension -> content type lookup table
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: BTreeMap<String, String>,
}

impl Default for MimeTable {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        for (ext, mime) in [
            ("html", "text/html"),
            ("htm", "text/html"),
            ("png", "image/png"),
            ("gif", "image/gif"),
            ("css", "text/css"),
            ("js", "text/javascript"),
            ("txt", "text/plain"),
            ("json", "application/json"),
        ] {
            types.insert(ext.to_string(), mime.to_string());
        }
        Self { types }
    }
}

impl MimeTable {
    /// Add or override a mapping
    pub fn insert(&mut self, extension: impl Into<String>, content_type: impl Into<String>) {
        self.types.insert(extension.into(), content_type.into());
    }

    /// Merge a set of overrides into the table
    pub fn extend<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.types.extend(overrides);
    }

    /// Resolve the content type for a relative path by its extension
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&str> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        self.types.get(ext).map(String::as_str)
    }
}

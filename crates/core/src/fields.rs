//! Directory -> nested document fields
//!
//! Packages the non-attachment part of an application directory into nested
//! JSON fields: each path segment becomes an object key, `.json` files are
//! parsed, everything else is stored as a string. The reserved
//! `_attachments/` subtree is left to the attachment push.

use std::path::Path;

use color_eyre::Result;
use serde_json::{Map, Value};

use crate::scan::Scanner;

/// Reserved sub-directory holding attachment payloads
pub const ATTACHMENTS_DIR: &str = "_attachments";

/// Read every pushable file under `dir` (excluding `_attachments/`) into a
/// nested JSON object keyed by path segments, with the final file name
/// stripped of its extension.
///
/// # Errors
/// Returns an error if a file cannot be read, is not valid UTF-8, or a
/// `.json` file fails to parse.
pub fn dir_to_fields(dir: &Path) -> Result<Map<String, Value>> {
    let mut fields = Map::new();

    for (path, content) in Scanner::new(dir).scan()? {
        let mut segments: Vec<&str> = path.split('/').collect();
        if segments.first() == Some(&ATTACHMENTS_DIR) {
            continue;
        }

        let file_name = segments.pop().unwrap_or(&path);
        let (field_name, extension) = file_name.rsplit_once('.').unwrap_or((file_name, ""));

        let text = String::from_utf8(content)
            .map_err(|_| color_eyre::eyre::eyre!("{path}: field file is not valid UTF-8"))?;
        let value = if extension == "json" {
            serde_json::from_str(&text)
                .map_err(|e| color_eyre::eyre::eyre!("{path}: invalid JSON: {e}"))?
        } else {
            Value::String(text)
        };

        let mut node = &mut fields;
        for segment in segments {
            node = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or_else(|| {
                    color_eyre::eyre::eyre!("{path}: field path collides with a non-object value")
                })?;
        }
        node.insert(field_name.to_string(), value);
    }

    Ok(fields)
}

/// Splice the shared `forms/lib` blob into every form function.
///
/// When the packaged fields carry a `forms` object with a `lib` entry, that
/// entry is removed and injected as `var lib = <json>;` at the
/// `include-lib` marker of each remaining form body.
pub fn package_forms(fields: &mut Map<String, Value>) {
    let Some(Value::Object(forms)) = fields.get_mut("forms") else {
        return;
    };
    let Some(lib) = forms.remove("lib") else {
        return;
    };
    let lib = format!("var lib = {lib};");
    apply_lib(forms, &lib);
}

/// Splice the shared `views/_lib` blob into every view function.
///
/// The `_lib` entry is removed from the views object; each view's map and
/// reduce bodies get it injected at their `include-lib` marker.
pub fn package_views(fields: &mut Map<String, Value>) {
    let Some(Value::Object(views)) = fields.get_mut("views") else {
        return;
    };
    let Some(lib) = views.remove("_lib") else {
        return;
    };
    let lib = format!("var lib = {lib};");
    for view in views.values_mut() {
        if let Value::Object(funcs) = view {
            apply_lib(funcs, &lib);
        }
    }
}

fn apply_lib(funcs: &mut Map<String, Value>, lib: &str) {
    for value in funcs.values_mut() {
        if let Value::String(body) = value {
            *body = splice_lib(body, lib);
        }
    }
}

/// Replace the first `include-lib` marker (`//` or `#` comment, with or
/// without a space) with the lib blob. No marker, no change.
fn splice_lib(body: &str, lib: &str) -> String {
    const MARKERS: [&str; 4] = [
        "// include-lib",
        "//include-lib",
        "# include-lib",
        "#include-lib",
    ];

    let hit = MARKERS
        .iter()
        .filter_map(|marker| body.find(marker).map(|pos| (pos, *marker)))
        .min_by_key(|(pos, _)| *pos);

    match hit {
        Some((pos, marker)) => {
            let mut out = String::with_capacity(body.len() + lib.len());
            out.push_str(&body[..pos]);
            out.push_str(lib);
            out.push_str(&body[pos + marker.len()..]);
            out
        }
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_flat_text_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("language.txt"), "javascript").unwrap();

        let fields = dir_to_fields(dir.path()).unwrap();
        assert_eq!(fields["language"], "javascript");
    }

    #[test]
    fn test_nested_fields_follow_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("views/all")).unwrap();
        fs::write(dir.path().join("views/all/map.js"), "function(doc) {}").unwrap();

        let fields = dir_to_fields(dir.path()).unwrap();
        assert_eq!(fields["views"]["all"]["map"], "function(doc) {}");
    }

    #[test]
    fn test_json_files_are_parsed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meta.json"), r#"{"version": 2}"#).unwrap();

        let fields = dir_to_fields(dir.path()).unwrap();
        assert_eq!(fields["meta"]["version"], 2);
    }

    #[test]
    fn test_attachments_subtree_excluded() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_attachments")).unwrap();
        fs::write(dir.path().join("_attachments/index.html"), "<html>").unwrap();
        fs::write(dir.path().join("title.txt"), "blog").unwrap();

        let fields = dir_to_fields(dir.path()).unwrap();
        assert!(!fields.contains_key("_attachments"));
        assert!(!fields.contains_key("index"));
        assert_eq!(fields["title"], "blog");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{nope").unwrap();

        assert!(dir_to_fields(dir.path()).is_err());
    }

    #[test]
    fn test_package_views_splices_lib() {
        let mut fields = serde_json::json!({
            "views": {
                "_lib": "function helper() {}",
                "recent": {
                    "map": "// include-lib\nfunction(doc) { emit(helper(doc)); }"
                }
            }
        });
        let fields = fields.as_object_mut().unwrap();

        package_views(fields);

        assert!(!fields["views"].as_object().unwrap().contains_key("_lib"));
        let map = fields["views"]["recent"]["map"].as_str().unwrap();
        assert!(map.starts_with("var lib = \"function helper() {}\";\n"));
        assert!(map.contains("emit(helper(doc))"));
    }

    #[test]
    fn test_package_forms_splices_lib() {
        let mut fields = serde_json::json!({
            "forms": {
                "lib": {"templates": "..."},
                "post": "#include-lib\nrender(lib.templates);"
            }
        });
        let fields = fields.as_object_mut().unwrap();

        package_forms(fields);

        assert!(!fields["forms"].as_object().unwrap().contains_key("lib"));
        let post = fields["forms"]["post"].as_str().unwrap();
        assert!(post.starts_with("var lib = {\"templates\":\"...\"};\n"));
    }

    #[test]
    fn test_package_views_without_lib_is_untouched() {
        let mut fields = serde_json::json!({
            "views": {"all": {"map": "// include-lib\nfunction(doc) {}"}}
        });
        let fields = fields.as_object_mut().unwrap();

        package_views(fields);

        // No _lib blob, so the marker stays put
        assert_eq!(
            fields["views"]["all"]["map"],
            "// include-lib\nfunction(doc) {}"
        );
    }

    #[test]
    fn test_splice_lib_replaces_first_marker_only() {
        let spliced = splice_lib("// include-lib\n// include-lib", "LIB");
        assert_eq!(spliced, "LIB\n// include-lib");
    }
}

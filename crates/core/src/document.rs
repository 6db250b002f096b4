//! The remote document: attachments plus the sidecar signature index
//!
//! Mirrors the CouchDB wire shape: `_id`/`_rev`, an `_attachments` map with
//! base64 payloads (or stub markers when the store did not materialize the
//! payload), and a `signatures` map recording the fingerprint of what was
//! last pushed. Every other top-level field is preserved verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hash::Fingerprint;

/// A named payload stored inside a document.
///
/// When fetched from the store, `data` may be absent and replaced by a
/// `stub`/`length` marker. Those markers must be stripped before a payload
/// overwrite, otherwise the store keeps the old bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

impl Attachment {
    /// A full attachment carrying its payload
    #[must_use]
    pub fn inline(data: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            content_type,
            data: Some(data),
            stub: None,
            length: None,
        }
    }

    /// Whether this entry is a transport stub without payload
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.stub == Some(true)
    }

    /// Replace the payload, discarding any stub/length markers
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.stub = None;
        self.length = None;
        self.data = Some(data);
    }
}

/// The target document, id-addressed in the remote store.
///
/// The reconciler only ever reads and writes `attachments` and `signatures`;
/// `extra` carries all unrelated top-level fields untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(rename = "_attachments", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attachments: BTreeMap<String, Attachment>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signatures: BTreeMap<String, Fingerprint>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create an empty document with the given id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: None,
            attachments: BTreeMap::new(),
            signatures: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Base64 (de)serialization for optional attachment payloads
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD
                .decode(&s)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid base64 payload: {e}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_payload_roundtrip() {
        let attachment = Attachment::inline(b"<html></html>".to_vec(), Some("text/html".into()));
        let json = serde_json::to_string(&attachment).unwrap();
        let back: Attachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attachment);
    }

    #[test]
    fn test_attachment_data_is_base64_on_the_wire() {
        let attachment = Attachment::inline(b"hello".to_vec(), None);
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value["data"], "aGVsbG8=");
    }

    #[test]
    fn test_stub_attachment_parses_without_data() {
        let json = r#"{"content_type":"text/css","stub":true,"length":120}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert!(attachment.is_stub());
        assert_eq!(attachment.length, Some(120));
        assert!(attachment.data.is_none());
    }

    #[test]
    fn test_set_data_strips_stub_markers() {
        let mut attachment = Attachment {
            content_type: Some("text/css".into()),
            data: None,
            stub: Some(true),
            length: Some(120),
        };
        attachment.set_data(b"body {}".to_vec());
        assert!(attachment.stub.is_none());
        assert!(attachment.length.is_none());
        assert_eq!(attachment.data.as_deref(), Some(b"body {}".as_slice()));
        assert_eq!(attachment.content_type.as_deref(), Some("text/css"));
    }

    #[test]
    fn test_unrelated_fields_roundtrip() {
        let json = r#"{
            "_id": "_design/blog",
            "_rev": "3-abc",
            "language": "javascript",
            "views": {"all": {"map": "function(doc) {}"}},
            "signatures": {},
            "_attachments": {}
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "_design/blog");
        assert_eq!(doc.rev.as_deref(), Some("3-abc"));
        assert_eq!(doc.extra["language"], "javascript");
        assert!(doc.extra.contains_key("views"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["language"], "javascript");
        assert_eq!(back["views"]["all"]["map"], "function(doc) {}");
    }
}

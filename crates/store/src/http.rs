//! HTTP document store speaking the CouchDB wire conventions
//!
//! Documents live at `{base}/{db}/{id}`. Fetches come back with attachment
//! payloads replaced by stub/length markers; saves PUT the full document and
//! answer with the new revision. A 409 means the document moved underneath
//! us and is surfaced as a conflict, never retried here.

use std::time::Duration;

use async_trait::async_trait;
use attache_core::Document;
use reqwest::StatusCode;
use tracing::debug;

use crate::{DocumentStore, StoreError};

/// HTTP client for a single database in a document store.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    database: String,
}

impl HttpStore {
    /// Create a store client for `database` at `base_url`
    /// (e.g. `http://127.0.0.1:5984`).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, database: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
        })
    }

    fn document_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.database,
            encode_doc_id(id)
        )
    }
}

/// Percent-encode the slash in structured document ids (`_design/name`),
/// which would otherwise read as a path separator.
fn encode_doc_id(id: &str) -> String {
    id.replace('/', "%2F")
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn fetch(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(id);
        debug!(%url, "fetching document");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let doc: Document = response.json().await?;
                Ok(Some(doc))
            }
            status => Err(StoreError::Unexpected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn save(&self, document: &Document) -> Result<String, StoreError> {
        let url = self.document_url(&document.id);
        debug!(%url, "saving document");

        let response = self.client.put(&url).json(document).send().await?;
        match response.status() {
            StatusCode::CONFLICT => Err(StoreError::Conflict {
                id: document.id.clone(),
            }),
            status if status.is_success() => {
                let body: serde_json::Value = response.json().await?;
                body["rev"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| StoreError::Unexpected {
                        status: status.as_u16(),
                        body: body.to_string(),
                    })
            }
            status => Err(StoreError::Unexpected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

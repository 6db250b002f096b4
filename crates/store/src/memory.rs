//! In-process document store for testing
//!
//! Behaves like the real store where it matters to the push path: fetches
//! return attachment stubs instead of payloads, saves check the revision and
//! reject stale writers, and a stubbed attachment in a save keeps the
//! payload of the prior revision.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use attache_core::Document;

use crate::{DocumentStore, StoreError};

/// Document store backed by an in-memory map
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Whether the store holds no documents
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored document with payloads materialized, for assertions
    #[must_use]
    pub fn raw(&self, id: &str) -> Option<Document> {
        self.documents.lock().unwrap().get(id).cloned()
    }
}

fn next_rev(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split('-').next())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-mem", generation + 1)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.lock().unwrap();
        let Some(stored) = documents.get(id) else {
            return Ok(None);
        };

        // The wire never carries payloads back on a plain fetch
        let mut doc = stored.clone();
        for attachment in doc.attachments.values_mut() {
            if let Some(data) = attachment.data.take() {
                attachment.stub = Some(true);
                attachment.length = Some(data.len() as u64);
            }
        }
        Ok(Some(doc))
    }

    async fn save(&self, document: &Document) -> Result<String, StoreError> {
        let mut documents = self.documents.lock().unwrap();
        let previous = documents.get(&document.id);

        let current_rev = previous.and_then(|d| d.rev.as_deref());
        if document.rev.as_deref() != current_rev {
            return Err(StoreError::Conflict {
                id: document.id.clone(),
            });
        }

        let mut stored = document.clone();
        for (path, attachment) in &mut stored.attachments {
            if attachment.is_stub() {
                let prior = previous
                    .and_then(|d| d.attachments.get(path))
                    .and_then(|a| a.data.clone())
                    .ok_or_else(|| StoreError::Unexpected {
                        status: 412,
                        body: format!("stub for unknown attachment {path}"),
                    })?;
                attachment.set_data(prior);
            }
        }

        let rev = next_rev(current_rev);
        stored.rev = Some(rev.clone());
        documents.insert(stored.id.clone(), stored);
        Ok(rev)
    }
}

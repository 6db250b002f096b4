//! attache-store: the document store boundary
//!
//! Defines the `DocumentStore` trait, the CouchDB-style HTTP implementation,
//! an in-process store for tests, and the push orchestration that ties
//! scanning and reconciliation to a store.

pub mod error;
pub mod http;
pub mod memory;
pub mod push;

use async_trait::async_trait;
use attache_core::Document;

pub use error::StoreError;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use push::{PushOptions, PushOutcome, default_doc_id, push_app, push_directory};

/// Fetch-by-id and save-by-id against a remote document store.
///
/// `fetch` translates the store's not-found response into `Ok(None)`; a save
/// persists the full document as one unit, replacing the prior revision, and
/// returns the new revision token.
#[async_trait]
pub trait DocumentStore {
    /// Fetch the current document, or `None` if it does not exist yet.
    async fn fetch(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Persist the document as a single atomic write.
    async fn save(&self, document: &Document) -> Result<String, StoreError>;
}

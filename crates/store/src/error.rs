//! Store error taxonomy
//!
//! "Document does not exist" is not represented here: `fetch` returns
//! `Ok(None)` for that case, so callers cannot confuse absence with an
//! unreachable store.

/// Errors from the document store boundary
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document changed between fetch and save. Not retried; the whole
    /// invocation is safe to re-run.
    #[error("save conflict on document {id}: it changed since it was fetched")]
    Conflict { id: String },

    /// The store was unreachable or the request failed in transit
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with something we cannot interpret
    #[error("unexpected store response ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

//! Push orchestration: scan -> fingerprint -> fetch -> reconcile -> save
//!
//! The single point where local filesystem state meets the store. The local
//! side is never mutated, so a failed invocation is always safe to re-run.

use std::path::Path;

use color_eyre::Result;
use tracing::info;

use attache_core::{
    ATTACHMENTS_DIR, Document, MimeTable, PushConfig, ReconcileSummary, Scanner, dir_to_fields,
    package_forms, package_views, reconcile,
};

use crate::DocumentStore;

/// Knobs for a push, typically derived from `.attache.toml`
#[derive(Debug, Default)]
pub struct PushOptions {
    pub include_extensionless: bool,
    pub mime: MimeTable,
}

impl From<&PushConfig> for PushOptions {
    fn from(config: &PushConfig) -> Self {
        Self {
            include_extensionless: config.include_extensionless,
            mime: config.mime_table(),
        }
    }
}

/// What a push invocation ended up doing
#[derive(Debug)]
pub enum PushOutcome {
    /// The directory held no pushable files; nothing was fetched or saved
    NothingToPush,
    /// The document was created or brought in sync
    Pushed {
        rev: String,
        summary: ReconcileSummary,
    },
}

/// Derive a document id from a directory path: its last non-empty component.
#[must_use]
pub fn default_doc_id(dir: &Path) -> Option<String> {
    dir.components().rev().find_map(|c| {
        let name = c.as_os_str().to_string_lossy();
        (!name.is_empty() && name != "/").then(|| name.into_owned())
    })
}

/// Push a directory tree into the attachment set of `doc_id`.
///
/// Scans first and fails fast on I/O before touching the network. An empty
/// scan returns [`PushOutcome::NothingToPush`] without a fetch or save. A
/// missing remote document is the initial-push case, not an error. The save
/// is a single write; a conflict or transport failure aborts the invocation
/// with no partial effect.
///
/// # Errors
/// Returns an error if scanning fails or the store rejects the fetch/save.
pub async fn push_directory<S: DocumentStore>(
    store: &S,
    dir: &Path,
    doc_id: &str,
    options: &PushOptions,
) -> Result<PushOutcome> {
    let local = Scanner::new(dir)
        .include_extensionless(options.include_extensionless)
        .scan()?;

    if local.is_empty() {
        info!(id = doc_id, "no pushable files, skipping");
        return Ok(PushOutcome::NothingToPush);
    }

    let existing = store.fetch(doc_id).await?;
    let (doc, summary) = reconcile(doc_id, &local, existing, &options.mime);

    info!(
        id = doc_id,
        created = summary.created.len(),
        updated = summary.updated.len(),
        deleted = summary.deleted.len(),
        unchanged = summary.unchanged.len(),
        "pushing document"
    );

    let rev = store.save(&doc).await?;
    Ok(PushOutcome::Pushed { rev, summary })
}

/// Push a whole application directory as a design document.
///
/// Non-attachment files become nested document fields (merged over the
/// existing document, preserving its revision and any fields the directory
/// does not define), shared `lib`/`_lib` blobs are spliced into form and
/// view functions, then the `_attachments/` subtree is pushed into the
/// attachment set of the same document.
///
/// # Errors
/// Returns an error if field packaging, scanning, or either save fails.
pub async fn push_app<S: DocumentStore>(
    store: &S,
    app_dir: &Path,
    app_name: &str,
    options: &PushOptions,
) -> Result<PushOutcome> {
    let doc_id = format!("_design/{app_name}");
    let mut fields = dir_to_fields(app_dir)?;
    package_forms(&mut fields);
    package_views(&mut fields);

    let mut doc = store
        .fetch(&doc_id)
        .await?
        .unwrap_or_else(|| Document::new(&doc_id));
    doc.id = doc_id.clone();
    for (key, value) in fields {
        doc.extra.insert(key, value);
    }

    info!(id = %doc_id, "saving document fields");
    store.save(&doc).await?;

    push_directory(store, &app_dir.join(ATTACHMENTS_DIR), &doc_id, options).await
}

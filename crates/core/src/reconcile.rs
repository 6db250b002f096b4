//! Reconciliation: the minimal create/update/delete set
//!
//! Pure in-memory diffing of the local file set against the document's
//! signature index. No I/O here; the caller fetches the existing document
//! and persists the result as a single save.

use tracing::debug;

use crate::document::{Attachment, Document};
use crate::hash::Fingerprint;
use crate::mime::MimeTable;
use crate::scan::LocalFiles;

/// What a reconciliation pass decided to do, per path.
#[derive(Debug, Clone, Default)]
pub struct ReconcileSummary {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ReconcileSummary {
    /// True when no mutation was performed
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of mutations
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

/// Compute the document that brings the remote attachment set in sync with
/// `local`, and a summary of the applied mutations.
///
/// With no existing document this is the initial push: a fresh document
/// carrying every local file. With an existing document, three disjoint key
/// sets are computed against its signature index:
///
/// - present remotely (in either map) but not locally: removed from both
///   maps
/// - present in both with differing fingerprints: payload replaced, stub
///   markers stripped, signature refreshed (content type is not re-resolved)
/// - present only locally: attachment and signature inserted, content type
///   resolved from the extension
///
/// Paths with matching fingerprints are left untouched. All other top-level
/// document fields pass through unmodified.
#[must_use]
pub fn reconcile(
    doc_id: &str,
    local: &LocalFiles,
    existing: Option<Document>,
    mime: &MimeTable,
) -> (Document, ReconcileSummary) {
    let mut summary = ReconcileSummary::default();

    let Some(mut doc) = existing else {
        debug!(id = doc_id, files = local.len(), "creating document");
        let mut doc = Document::new(doc_id);
        for (path, content) in local {
            doc.signatures
                .insert(path.clone(), Fingerprint::from_bytes(content));
            doc.attachments.insert(
                path.clone(),
                Attachment::inline(content.clone(), mime.resolve(path).map(String::from)),
            );
            summary.created.push(path.clone());
        }
        return (doc, summary);
    };

    // Remove attachments whose file no longer exists locally. The sweep
    // covers the union of both maps: an attachment without a signature
    // entry (attached out-of-band) must not survive either.
    let to_delete: std::collections::BTreeSet<String> = doc
        .signatures
        .keys()
        .chain(doc.attachments.keys())
        .filter(|path| !local.contains_key(*path))
        .cloned()
        .collect();
    for path in to_delete {
        debug!(%path, "deleting");
        doc.signatures.remove(&path);
        doc.attachments.remove(&path);
        summary.deleted.push(path);
    }

    for (path, content) in local {
        let fingerprint = Fingerprint::from_bytes(content);

        match doc.signatures.get(path) {
            Some(known) if *known == fingerprint => {
                debug!(%path, "no change, skipping");
                summary.unchanged.push(path.clone());
            }
            Some(_) => {
                debug!(%path, "replacing");
                doc.signatures.insert(path.clone(), fingerprint);
                match doc.attachments.get_mut(path) {
                    Some(attachment) => attachment.set_data(content.clone()),
                    // Signature without attachment should not happen, but
                    // converge rather than drop the file
                    None => {
                        doc.attachments.insert(
                            path.clone(),
                            Attachment::inline(
                                content.clone(),
                                mime.resolve(path).map(String::from),
                            ),
                        );
                    }
                }
                summary.updated.push(path.clone());
            }
            None => {
                debug!(%path, "creating");
                doc.signatures.insert(path.clone(), fingerprint);
                doc.attachments.insert(
                    path.clone(),
                    Attachment::inline(content.clone(), mime.resolve(path).map(String::from)),
                );
                summary.created.push(path.clone());
            }
        }
    }

    (doc, summary)
}

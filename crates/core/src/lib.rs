//! attache-core: Core push reconciliation engine
//!
//! Provides directory scanning, content fingerprinting, the document model,
//! and the create/update/delete reconciliation against a document's
//! attachment set.

pub mod config;
pub mod document;
pub mod fields;
pub mod hash;
pub mod mime;
pub mod reconcile;
pub mod scan;

pub use config::PushConfig;
pub use document::{Attachment, Document};
pub use fields::{ATTACHMENTS_DIR, dir_to_fields, package_forms, package_views};
pub use hash::Fingerprint;
pub use mime::MimeTable;
pub use reconcile::{ReconcileSummary, reconcile};
pub use scan::{LocalFiles, Scanner};

//! Editor core for translating nested JSON language files.
//!
//! Two documents (default language, translated language) live in a
//! [`store::DocumentStore`]; [`json_utils`] decomposes them into flat
//! (path, value) entries and writes edits back; [`reconcile`] derives the
//! per-leaf rows and the completion metric a UI shows. [`cli`] is the thin
//! shell over all of it.

pub mod cli;
pub mod config;
pub mod errors;
pub mod json_utils;
pub mod reconcile;
pub mod store;

// Re-export the types most callers touch.
pub use json_utils::{Entry, KeyPath, flatten_entries, merge_at_path, unflatten_entries};
pub use reconcile::{Completion, ReconciliationView, Refresh, Row};
pub use store::{ChangeEvent, Document, DocumentStore, Origin};

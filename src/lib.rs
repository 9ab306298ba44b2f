//! # relist
//!
//! Edit a directory as text, get back the filesystem operations.
//!
//! relist reconciles a human-edited listing of a directory against a snapshot
//! of what the directory held when the listing was rendered. Each existing
//! entry is rendered with a stable identifier marker (`/<id> `), so the engine
//! can tell a rename from a delete-and-create, an attribute edit from a type
//! change, and a brand-new line from a moved one. The result is a list of
//! [`Diff`]s plus a list of line-level [`ParseError`]s. Nothing is executed.
//!
//! relist owns the line grammar, the reconciliation engine, and the contracts
//! ([`Column`], [`SnapshotCache`], [`Visibility`], [`Adapter`]). It ships a
//! local-disk adapter, an in-memory snapshot and a few columns as
//! conveniences. Applying the diffs and rendering the listing belong to the
//! caller.
//!
//! # Quick Start
//!
//! ```rust
//! use relist::{Diff, EntryType, Snapshot};
//!
//! let url = "file:///srv/project/";
//! let mut snapshot = Snapshot::new();
//! let readme = snapshot.store_entry(url, "README.md", EntryType::File, None);
//! let old    = snapshot.store_entry(url, "old.log", EntryType::File, None);
//!
//! // The local adapter renders permissions, size and mtime columns; entries
//! // without stored metadata show placeholders.
//! let lines = [
//!     format!("/{readme} --------- - - README.txt"),
//!     "docs/".to_string(),
//! ];
//!
//! let result = relist::reconcile().run(&snapshot, url, &lines);
//!
//! assert!(result.errors.is_empty());
//! assert_eq!(result.diffs, vec![
//!     Diff::Create { name: "README.txt".into(), entry_type: EntryType::File, id: Some(readme), link_target: None },
//!     Diff::Create { name: "docs".into(), entry_type: EntryType::Directory, id: None, link_target: None },
//!     Diff::Delete { name: "README.md".into(), id: readme },
//!     Diff::Delete { name: "old.log".into(), id: old },
//! ]);
//! ```
//!
//! # Custom Columns and Adapters
//!
//! Implement [`Column`] to add an attribute to the line grammar and
//! [`Adapter`] to list a new backend, then register the adapter for a URL
//! scheme:
//!
//! ```rust
//! use std::sync::Arc;
//! use relist::{Adapter, Column, ListedEntry, Permissions, RelistError};
//!
//! struct Archive;
//!
//! impl Adapter for Archive {
//!     fn name(&self) -> &str { "archive" }
//!
//!     fn supported_columns(&self) -> Vec<Arc<dyn Column>> {
//!         vec![Arc::new(Permissions)]
//!     }
//!
//!     fn list(&self, _dir: &str) -> Result<Vec<ListedEntry>, RelistError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let builder = relist::reconcile().adapter("zip://", Archive);
//! ```

#![forbid(unsafe_code)]

pub mod classifier;
pub mod columns;
pub mod engine;

mod builder;
mod diff;
mod entry;
mod error;
mod local;
mod registry;
mod results;
mod snapshot;
mod traits;
mod visibility;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::{ReconcileBuilder, ReconcileOptions};
pub use columns::{ColumnValue, Mtime, Permissions, Size};
pub use diff::Diff;
pub use engine::NameCase;
pub use entry::{CandidateEntry, EntryId, EntryMeta, EntryType, ListedEntry, SnapshotEntry};
pub use error::{ParseError, ParseErrorKind, RelistError};
pub use local::LocalAdapter;
pub use registry::{split_url, AdapterRegistry};
pub use results::{PassStats, Reconciliation};
pub use snapshot::Snapshot;
pub use traits::{Adapter, Column, SnapshotCache, Visibility};
pub use visibility::{HideDotfiles, IgnoreGlobs, ShowAll};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`ReconcileBuilder`] to configure and run a pass.
///
/// Defaults: local-disk adapter under `file://`, dotfiles hidden, the host
/// platform's name case rule.
///
/// # Example
///
/// ```rust
/// use relist::{Diff, EntryType, Snapshot};
///
/// let snapshot = Snapshot::new();
/// let result = relist::reconcile().run(&snapshot, "file:///tmp/", ["notes.txt", "", "  "]);
///
/// assert_eq!(result.diffs, vec![Diff::Create {
///     name: "notes.txt".into(),
///     entry_type: EntryType::File,
///     id: None,
///     link_target: None,
/// }]);
/// ```
pub fn reconcile() -> ReconcileBuilder {
    ReconcileBuilder::default()
}

use std::sync::Arc;

use crate::columns::ColumnValue;
use crate::entry::{EntryId, ListedEntry, SnapshotEntry};
use crate::error::RelistError;

/// One named, independently parseable attribute of an entry.
///
/// Columns are decoded positionally: each one consumes a prefix of the line
/// and hands the remainder to the next. The text left after the last column
/// is the entry name.
///
/// # Thread Safety
///
/// `Send + Sync` are required. Adapters hand out columns as
/// `Arc<dyn Column>` and a host may reconcile several buffers at once.
///
/// # Example
///
/// ```rust
/// use relist::{Column, ColumnValue, SnapshotEntry};
///
/// struct Owner;
///
/// impl Column for Owner {
///     fn name(&self) -> &str { "owner" }
///
///     fn parse<'a>(&self, rem: &'a str) -> Option<(ColumnValue, &'a str)> {
///         let (field, rest) = rem.split_once(' ')?;
///         Some((ColumnValue::Text(field.to_string()), rest.trim_start()))
///     }
///
///     fn format(&self, entry: &SnapshotEntry) -> String {
///         match entry.attribute("owner") {
///             Some(ColumnValue::Text(t)) => t.clone(),
///             _ => "-".to_string(),
///         }
///     }
/// }
///
/// let (value, rest) = Owner.parse("root  passwd").unwrap();
/// assert_eq!(value, ColumnValue::Text("root".into()));
/// assert_eq!(rest, "passwd");
/// ```
pub trait Column: Send + Sync {
    /// Column name, used as the attribute key and in `Change` diffs.
    fn name(&self) -> &str;

    /// Decode this column from the start of `rem`.
    ///
    /// Returns the value and the unconsumed remainder, or `None` if the
    /// expected text is not there.
    fn parse<'a>(&self, rem: &'a str) -> Option<(ColumnValue, &'a str)>;

    /// `true` if `value` differs semantically from what `entry` has stored,
    /// meaning a `Change` diff is needed.
    ///
    /// Read-only columns keep the default and never produce changes.
    fn differs(&self, _entry: &SnapshotEntry, _value: &ColumnValue) -> bool {
        false
    }

    /// Render this column for `entry`. The output must be accepted by
    /// [`parse`](Column::parse) when followed by whitespace.
    fn format(&self, entry: &SnapshotEntry) -> String;
}

/// Read access to previously captured directory state.
///
/// The engine borrows the cache immutably for a whole pass and never
/// re-reads it mid-pass.
pub trait SnapshotCache {
    /// Look up an entry by its identifier.
    fn get_entry_by_id(&self, id: EntryId) -> Option<&SnapshotEntry>;

    /// All known children of the directory at `url`, in no particular order.
    fn list_children(&self, url: &str) -> Vec<&SnapshotEntry>;
}

/// Decides which cached entries are expected to appear in the listing.
///
/// Hidden entries are left out of the working mapping, so their absence from
/// the text never turns into a `Delete`.
///
/// # Example
///
/// ```rust
/// use relist::{Visibility, SnapshotEntry};
///
/// struct HideBackups;
///
/// impl Visibility for HideBackups {
///     fn is_visible(&self, entry: &SnapshotEntry) -> bool {
///         !entry.name.ends_with('~')
///     }
/// }
/// ```
pub trait Visibility: Send + Sync {
    /// Returns `true` if this entry is rendered in the listing.
    fn is_visible(&self, entry: &SnapshotEntry) -> bool;
}

/// A storage backend: local disk, remote host, archive, ...
///
/// Object-safe so a registry can hold `Arc<dyn Adapter>`.
pub trait Adapter: Send + Sync {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    /// Columns this backend renders, in display order.
    fn supported_columns(&self) -> Vec<Arc<dyn Column>>;

    /// List the immediate children of `dir` (the path part of the buffer URL).
    ///
    /// Yield recoverable problems with single children by skipping them;
    /// return `Err` only when the directory itself cannot be read.
    fn list(&self, dir: &str) -> Result<Vec<ListedEntry>, RelistError>;
}

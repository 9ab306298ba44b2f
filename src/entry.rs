use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnValue;

/// Stable identifier assigned by a [`SnapshotCache`](crate::traits::SnapshotCache).
pub type EntryId = u64;

/// The kind of a directory entry.
///
/// `Other` carries a backend-specific type name (sockets, archive members,
/// remote-only kinds, ...) that the text format cannot express. It survives a
/// reconciliation pass untouched unless the user makes the line look like a
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A regular file.
    File,

    /// A directory.
    Directory,

    /// A symbolic link.
    Link,

    /// Anything else, named by the backend.
    Other(String),
}

impl EntryType {
    /// `true` for the two types the listing syntax can state directly.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::File | Self::Directory)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File      => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
            Self::Link      => f.write_str("link"),
            Self::Other(t)  => f.write_str(t),
        }
    }
}

/// Metadata stored alongside a snapshot entry.
///
/// `attributes` is keyed by column name and holds whatever the adapter
/// captured when the directory was listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Target of a symbolic link, when known.
    pub link: Option<String>,

    /// Stored column values, keyed by column name.
    pub attributes: BTreeMap<String, ColumnValue>,
}

impl EntryMeta {
    pub fn with_link(mut self, target: impl Into<String>) -> Self {
        self.link = Some(target.into());
        self
    }

    pub fn with_attribute(mut self, column: impl Into<String>, value: ColumnValue) -> Self {
        self.attributes.insert(column.into(), value);
        self
    }
}

/// The previously known state of one child of a directory.
///
/// Owned by the cache. The engine only ever reads these.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// Identifier assigned by the cache.
    pub id: EntryId,

    /// Base name within the parent directory.
    pub name: String,

    /// What kind of entry this is.
    pub entry_type: EntryType,

    /// `None` when the backend stored no metadata at all.
    pub meta: Option<EntryMeta>,
}

impl SnapshotEntry {
    /// Stored value for `column`, if any metadata was captured for it.
    pub fn attribute(&self, column: &str) -> Option<&ColumnValue> {
        self.meta.as_ref().and_then(|m| m.attributes.get(column))
    }

    /// Stored link target, if any.
    pub fn link_target(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.link.as_deref())
    }
}

/// An entry produced by an [`Adapter`](crate::traits::Adapter) listing, before
/// the cache has assigned it an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub meta: Option<EntryMeta>,
}

/// One line of the listing after classification, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry {
    /// Present only if the line carried a `/<digits>` marker.
    pub id: Option<EntryId>,

    /// Base name with surrounding whitespace and the trailing separator removed.
    pub name: String,

    /// Inferred type: from the trailing separator, the snapshot, or `File`.
    pub entry_type: EntryType,

    /// Present only for `name -> target` lines.
    pub link_target: Option<String>,

    /// Column values decoded from the text between the marker and the name.
    pub attributes: BTreeMap<String, ColumnValue>,
}

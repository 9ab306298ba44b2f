use serde::{Deserialize, Serialize};

use crate::columns::ColumnValue;
use crate::entry::{EntryId, EntryType};

/// One operation needed to bring storage in line with the edited listing.
///
/// Serialized with an internal `"type"` tag (`"new"`, `"delete"`, `"change"`)
/// so an apply stage in another process can consume the list directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Diff {
    /// Place an entry at `name`.
    ///
    /// With `id: None` this is a brand-new entry. With `id: Some(_)` it places
    /// an existing entry: a move when the identity lives under another name,
    /// or an in-place replacement (new link target, new type) when the name
    /// is the identity's own.
    #[serde(rename = "new")]
    Create {
        name:        String,
        entry_type:  EntryType,
        id:          Option<EntryId>,
        link_target: Option<String>,
    },

    /// Remove a snapshot entry no surviving line claimed.
    Delete {
        name: String,
        id:   EntryId,
    },

    /// Update one attribute of a matched entry.
    Change {
        name:       String,
        entry_type: EntryType,
        column:     String,
        value:      ColumnValue,
    },
}

impl Diff {
    /// The entry name this operation targets.
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. } | Self::Delete { name, .. } | Self::Change { name, .. } => name,
        }
    }

    /// The existing identity involved, if any.
    pub fn id(&self) -> Option<EntryId> {
        match self {
            Self::Create { id, .. } => *id,
            Self::Delete { id, .. } => Some(*id),
            Self::Change { .. }     => None,
        }
    }
}

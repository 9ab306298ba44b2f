use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::entry::{EntryId, EntryMeta, EntryType, ListedEntry, SnapshotEntry};
use crate::traits::SnapshotCache;

/// In-memory [`SnapshotCache`].
///
/// Identifiers are assigned from a counter starting at 1 and are never
/// reused within one `Snapshot`, even after `clear()`. An entry re-stored under
/// a name its directory already knows keeps that name's identifier, so a
/// refresh does not renumber lines the user may be editing.
#[derive(Debug)]
pub struct Snapshot {
    next_id: EntryId,
    entries: HashMap<EntryId, SnapshotEntry>,
    /// directory URL → child name → identifier
    dirs:    HashMap<String, BTreeMap<String, EntryId>>,
    parents: HashMap<EntryId, String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
            dirs:    HashMap::new(),
            parents: HashMap::new(),
        }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry under `url`, returning its identifier.
    pub fn store_entry(
        &mut self,
        url: &str,
        name: impl Into<String>,
        entry_type: EntryType,
        meta: Option<EntryMeta>,
    ) -> EntryId {
        let name = name.into();
        let children = self.dirs.entry(url.to_string()).or_default();
        let id = match children.get(&name) {
            Some(id) => *id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                children.insert(name.clone(), id);
                id
            }
        };
        self.parents.insert(id, url.to_string());
        self.entries.insert(id, SnapshotEntry { id, name, entry_type, meta });
        id
    }

    /// Replace everything known about `url` with a fresh listing.
    ///
    /// Children that disappeared are forgotten. Children still present keep
    /// their identifiers.
    pub fn populate(&mut self, url: &str, listed: Vec<ListedEntry>) -> Vec<EntryId> {
        let previous = self.dirs.remove(url).unwrap_or_default();
        let mut kept = BTreeMap::new();
        for entry in &listed {
            if let Some(id) = previous.get(&entry.name) {
                kept.insert(entry.name.clone(), *id);
            }
        }
        for (name, id) in &previous {
            if !kept.contains_key(name) {
                self.entries.remove(id);
                self.parents.remove(id);
            }
        }
        self.dirs.insert(url.to_string(), kept);

        let ids: Vec<EntryId> = listed
            .into_iter()
            .map(|e| self.store_entry(url, e.name, e.entry_type, e.meta))
            .collect();
        debug!(url, children = ids.len(), "populated directory snapshot");
        ids
    }

    /// Forget a directory and all of its children.
    pub fn remove_directory(&mut self, url: &str) {
        if let Some(children) = self.dirs.remove(url) {
            for id in children.values() {
                self.entries.remove(id);
                self.parents.remove(id);
            }
        }
    }

    /// Forget everything. Identifiers keep counting up.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirs.clear();
        self.parents.clear();
    }

    /// The directory URL an entry was stored under.
    pub fn parent_url(&self, id: EntryId) -> Option<&str> {
        self.parents.get(&id).map(String::as_str)
    }

    /// Look up a child of `url` by name.
    pub fn entry_by_name(&self, url: &str, name: &str) -> Option<&SnapshotEntry> {
        let id = self.dirs.get(url)?.get(name)?;
        self.entries.get(id)
    }

    /// `true` once `url` has been populated, even if it had no children.
    pub fn has_directory(&self, url: &str) -> bool {
        self.dirs.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotCache for Snapshot {
    fn get_entry_by_id(&self, id: EntryId) -> Option<&SnapshotEntry> {
        self.entries.get(&id)
    }

    fn list_children(&self, url: &str) -> Vec<&SnapshotEntry> {
        self.dirs
            .get(url)
            .map(|children| children.values().filter_map(|id| self.entries.get(id)).collect())
            .unwrap_or_default()
    }
}

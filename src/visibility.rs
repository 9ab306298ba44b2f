use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::entry::{EntryType, SnapshotEntry};
use crate::error::RelistError;
use crate::traits::Visibility;

/// Every cached entry is expected in the listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowAll;

impl Visibility for ShowAll {
    fn is_visible(&self, _entry: &SnapshotEntry) -> bool {
        true
    }
}

/// Dotfiles are not rendered. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideDotfiles;

impl Visibility for HideDotfiles {
    fn is_visible(&self, entry: &SnapshotEntry) -> bool {
        !entry.name.starts_with('.')
    }
}

/// Hides entries matching gitignore-style patterns.
///
/// Patterns are matched against the bare entry name, so `target/` hides a
/// directory called `target` and `*.o` hides object files.
#[derive(Debug, Clone)]
pub struct IgnoreGlobs {
    matcher: Gitignore,
}

impl IgnoreGlobs {
    pub fn new<I, S>(patterns: I) -> Result<Self, RelistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder
                .add_line(None, pattern.as_ref())
                .map_err(|e| RelistError::InvalidPattern(e.to_string()))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| RelistError::InvalidPattern(e.to_string()))?;
        Ok(Self { matcher })
    }
}

impl Visibility for IgnoreGlobs {
    fn is_visible(&self, entry: &SnapshotEntry) -> bool {
        let is_dir = entry.entry_type == EntryType::Directory;
        !self.matcher.matched(&entry.name, is_dir).is_ignore()
    }
}

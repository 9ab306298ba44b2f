use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classifier::{classify_line, ParsedLine, SEPARATOR};
use crate::diff::Diff;
use crate::entry::{CandidateEntry, EntryId, EntryType, SnapshotEntry};
use crate::error::{ParseError, ParseErrorKind};
use crate::results::{PassStats, Reconciliation};
use crate::traits::{Column, SnapshotCache};

// ---------------------------------------------------------------------------
// NameCase
// ---------------------------------------------------------------------------

/// How names are compared when looking for duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// `Foo` and `foo` are different entries.
    Sensitive,

    /// `Foo` and `foo` collide (macOS and Windows defaults).
    Insensitive,
}

impl NameCase {
    /// The usual rule for the host filesystem.
    pub fn platform() -> Self {
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Self::Sensitive   => Cow::Borrowed(name),
            Self::Insensitive => Cow::Owned(name.to_lowercase()),
        }
    }
}

impl Default for NameCase {
    fn default() -> Self {
        Self::platform()
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// A matched link must be re-created when the backend stored nothing about
/// it, or when the listing shows a different target. Link targets cannot be
/// updated in place.
pub(crate) fn needs_relink(entry: &SnapshotEntry, parsed_target: Option<&str>) -> bool {
    entry.entry_type == EntryType::Link
        && (entry.meta.is_none() || entry.link_target() != parsed_target)
}

// ---------------------------------------------------------------------------
// reconcile()
// ---------------------------------------------------------------------------

/// Reconcile edited listing `lines` against the snapshot.
///
/// `working` is the name → identifier mapping of every child the listing is
/// expected to show (already filtered for visibility). It is consumed: names
/// are claimed as lines match them and whatever is left becomes a `Delete`.
///
/// This never fails. Line problems are returned in
/// [`Reconciliation::errors`] and the rest of the buffer is still processed.
pub fn reconcile<C, I>(
    lines: I,
    cache: &C,
    working: BTreeMap<String, EntryId>,
    columns: &[Arc<dyn Column>],
    name_case: NameCase,
) -> Reconciliation
where
    C: SnapshotCache + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let start = Instant::now();
    let mut pass = Pass {
        columns,
        name_case,
        working,
        seen: HashSet::new(),
        diffs: Vec::new(),
        errors: Vec::new(),
    };

    let mut line_count = 0;
    for (lnum, line) in lines.into_iter().enumerate() {
        line_count += 1;
        match classify_line(line.as_ref(), columns, cache) {
            Err(kind) => pass.error(lnum, kind),
            Ok(ParsedLine::Existing { candidate, entry }) => pass.existing(lnum, candidate, entry),
            Ok(ParsedLine::New(candidate)) => pass.new_entry(lnum, candidate),
        }
    }

    let Pass { working, mut diffs, errors, .. } = pass;
    for (name, id) in working {
        trace!(name = %name, id, "unclaimed, deleting");
        diffs.push(Diff::Delete { name, id });
    }

    let stats = PassStats::compute(line_count, &diffs, errors.len(), start.elapsed());
    debug!(
        lines = stats.lines,
        creates = stats.creates,
        deletes = stats.deletes,
        changes = stats.changes,
        errors = stats.errors,
        "reconciled listing"
    );

    Reconciliation { diffs, errors, stats }
}

// ---------------------------------------------------------------------------
// Per-pass state
// ---------------------------------------------------------------------------

/// Everything one pass mutates. Never shared between passes.
struct Pass<'a> {
    columns:   &'a [Arc<dyn Column>],
    name_case: NameCase,
    working:   BTreeMap<String, EntryId>,
    seen:      HashSet<String>,
    diffs:     Vec<Diff>,
    errors:    Vec<ParseError>,
}

impl Pass<'_> {
    fn error(&mut self, lnum: usize, kind: ParseErrorKind) {
        trace!(lnum, error = %kind, "line rejected");
        self.errors.push(ParseError::at(lnum, kind));
    }

    /// Record `name` as seen. Later collisions are reported but do not stop
    /// the line from producing diffs.
    fn check_dupe(&mut self, lnum: usize, name: &str) {
        let key = self.name_case.normalize(name).into_owned();
        if !self.seen.insert(key) {
            self.error(lnum, ParseErrorKind::DuplicateFilename);
        }
    }

    fn existing(&mut self, lnum: usize, candidate: CandidateEntry, entry: Option<&SnapshotEntry>) {
        if candidate.name.is_empty() {
            return self.error(lnum, ParseErrorKind::MissingFilename);
        }
        let Some(entry) = entry else {
            return self.error(lnum, ParseErrorKind::UnknownIdentifier);
        };
        if candidate.name.contains(SEPARATOR) {
            return self.error(lnum, ParseErrorKind::FilenameContainsSeparator);
        }

        self.check_dupe(lnum, &candidate.name);

        let id = entry.id;
        if self.working.get(&candidate.name) == Some(&id) {
            if needs_relink(entry, candidate.link_target.as_deref()) {
                trace!(lnum, name = %candidate.name, id, "link target changed");
                self.diffs.push(Diff::Create {
                    name: candidate.name.clone(),
                    entry_type: EntryType::Link,
                    id: Some(id),
                    link_target: candidate.link_target.clone(),
                });
            }
            self.working.remove(&candidate.name);
        } else {
            trace!(lnum, name = %candidate.name, id, from = %entry.name, "placing existing entry");
            self.diffs.push(Diff::Create {
                name: candidate.name.clone(),
                entry_type: candidate.entry_type.clone(),
                id: Some(id),
                link_target: candidate.link_target.clone(),
            });
        }

        for column in self.columns {
            let Some(value) = candidate.attributes.get(column.name()) else {
                continue;
            };
            if column.differs(entry, value) {
                self.diffs.push(Diff::Change {
                    name: candidate.name.clone(),
                    entry_type: entry.entry_type.clone(),
                    column: column.name().to_string(),
                    value: value.clone(),
                });
            }
        }
    }

    fn new_entry(&mut self, lnum: usize, candidate: CandidateEntry) {
        if candidate.name.is_empty() {
            return;
        }
        self.check_dupe(lnum, &candidate.name);
        trace!(lnum, name = %candidate.name, kind = %candidate.entry_type, "new entry");
        self.diffs.push(Diff::Create {
            name: candidate.name,
            entry_type: candidate.entry_type,
            id: None,
            link_target: candidate.link_target,
        });
    }
}

//! Line classifier: one line of listing text in, one candidate entry out.
//!
//! Two line shapes exist:
//!
//! ```text
//! /<id> <column>... <name>[/][ -> <target>]     existing entry
//! <name>[/][ -> <target>]                       new entry
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entry::{CandidateEntry, EntryType, SnapshotEntry};
use crate::error::ParseErrorKind;
use crate::traits::{Column, SnapshotCache};

/// Path separator used by the listing text on every platform.
pub const SEPARATOR: char = '/';

/// Display syntax between a link name and its target.
pub const LINK_ARROW: &str = " -> ";

/// A classified line.
#[derive(Debug)]
pub enum ParsedLine<'c> {
    /// The line carried an identifier. `entry` is `None` when the cache no
    /// longer knows that identifier.
    Existing {
        candidate: CandidateEntry,
        entry:     Option<&'c SnapshotEntry>,
    },

    /// The line names an entry to create. `candidate.name` may be empty for
    /// a blank line.
    New(CandidateEntry),
}

/// `true` if the line is dispatched to the identifier branch.
pub fn has_id_marker(line: &str) -> bool {
    line.starts_with(SEPARATOR)
}

/// Strip one trailing separator. Returns the name and whether it was a directory.
pub(crate) fn strip_dir_suffix(name: &str) -> (&str, bool) {
    match name.strip_suffix(SEPARATOR) {
        Some(stripped) => (stripped, true),
        None           => (name, false),
    }
}

/// Split `/<digits> <rest>` into the identifier and the non-empty remainder.
fn split_id(line: &str) -> Option<(u64, &str)> {
    let body = line.strip_prefix(SEPARATOR)?;
    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_end == 0 {
        return None;
    }
    let id = body[..digits_end].parse().ok()?;
    let rest = body[digits_end..].strip_prefix(' ')?;
    if rest.is_empty() {
        return None;
    }
    Some((id, rest))
}

/// Snapshot types the listing cannot express win over the default `File`.
///
/// Only an explicit trailing separator overrides them.
pub(crate) fn preserve_type(inferred: EntryType, stored: &EntryType) -> EntryType {
    if !stored.is_plain() && inferred != EntryType::Directory {
        stored.clone()
    } else {
        inferred
    }
}

/// Classify one line.
///
/// Errors are returned as data: malformed identifier markers, columns that
/// fail to decode, and new-entry lines that start with a separator once
/// trimmed. An empty name is *not* an error here; the engine decides
/// what an empty name means for each branch.
pub fn classify_line<'c, C: SnapshotCache + ?Sized>(
    line: &str,
    columns: &[Arc<dyn Column>],
    cache: &'c C,
) -> Result<ParsedLine<'c>, ParseErrorKind> {
    if !has_id_marker(line) {
        if line.trim_start().starts_with(SEPARATOR) {
            return Err(ParseErrorKind::LeadingSeparatorInPath);
        }
        return Ok(ParsedLine::New(classify_new(line)));
    }

    let (id, mut rem) = split_id(line).ok_or(ParseErrorKind::MalformedIdentifier)?;

    let mut attributes = BTreeMap::new();
    for column in columns {
        let (value, next) = column
            .parse(rem)
            .ok_or_else(|| ParseErrorKind::ColumnParseFailure(column.name().to_string()))?;
        attributes.insert(column.name().to_string(), value);
        rem = next;
    }

    let (name, is_dir) = strip_dir_suffix(rem.trim());
    let mut candidate = CandidateEntry {
        id: Some(id),
        name: name.to_string(),
        entry_type: if is_dir { EntryType::Directory } else { EntryType::File },
        link_target: None,
        attributes,
    };

    let entry = cache.get_entry_by_id(id);
    let Some(stored) = entry else {
        return Ok(ParsedLine::Existing { candidate, entry });
    };

    if stored.entry_type == EntryType::Link && stored.link_target().is_some() {
        let pieces: Vec<&str> = rem.trim().split(LINK_ARROW).collect();
        let [display, target] = pieces.as_slice() else {
            candidate.name.clear();
            return Ok(ParsedLine::Existing { candidate, entry });
        };
        candidate.name = strip_dir_suffix(display.trim()).0.to_string();
        candidate.link_target = Some(target.to_string());
        candidate.entry_type = EntryType::Link;
    }

    candidate.entry_type = preserve_type(candidate.entry_type, &stored.entry_type);
    Ok(ParsedLine::Existing { candidate, entry })
}

/// Classify a line with no identifier: a request to create something.
pub(crate) fn classify_new(line: &str) -> CandidateEntry {
    let (name, is_dir) = strip_dir_suffix(line.trim());
    let mut candidate = CandidateEntry {
        id: None,
        name: name.to_string(),
        entry_type: if is_dir { EntryType::Directory } else { EntryType::File },
        link_target: None,
        attributes: BTreeMap::new(),
    };
    if let Some((link_name, target)) = name.split_once(LINK_ARROW) {
        if !target.contains(LINK_ARROW) {
            candidate.name = link_name.to_string();
            candidate.link_target = Some(target.to_string());
            candidate.entry_type = EntryType::Link;
        }
    }
    candidate
}

/// Render `entry` as a listing line that [`classify_line`] reads back
/// unchanged.
pub fn format_line(entry: &SnapshotEntry, columns: &[Arc<dyn Column>]) -> String {
    let mut line = format!("{}{}", SEPARATOR, entry.id);
    for column in columns {
        line.push(' ');
        line.push_str(&column.format(entry));
    }
    line.push(' ');
    line.push_str(&entry.name);
    match (&entry.entry_type, entry.link_target()) {
        (EntryType::Directory, _) => line.push(SEPARATOR),
        (EntryType::Link, Some(target)) => {
            line.push_str(LINK_ARROW);
            line.push_str(target);
        }
        _ => {}
    }
    line
}

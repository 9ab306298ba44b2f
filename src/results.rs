use std::time::Duration;

use crate::diff::Diff;
use crate::error::{ParseError, ParseErrorKind};

/// The output of one reconciliation pass.
///
/// Both lists are always returned together. The pass never stops early on a
/// line error, so `diffs` may be non-empty while `errors` is too; whether to
/// apply anything in that case is the caller's decision.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Operations in emission order: line diffs in line order, then deletes
    /// sorted by name.
    pub diffs: Vec<Diff>,

    /// Line errors in line order.
    pub errors: Vec<ParseError>,

    /// Counters for the pass.
    pub stats: PassStats,
}

impl Reconciliation {
    /// A pass aborted before reading any line.
    pub(crate) fn fatal(kind: ParseErrorKind) -> Self {
        Self {
            errors: vec![ParseError::at(0, kind)],
            stats: PassStats {
                errors: 1,
                ..PassStats::default()
            },
            ..Self::default()
        }
    }

    /// `true` if nothing changed and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.diffs.is_empty() && self.errors.is_empty()
    }

    /// `true` if the pass was aborted.
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| e.kind.is_fatal())
    }
}

/// Counters for a completed pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PassStats {
    /// Lines read, blank ones included.
    pub lines: usize,

    pub creates: usize,
    pub deletes: usize,
    pub changes: usize,
    pub errors:  usize,

    /// Wall-clock time of the pass.
    pub duration: Duration,
}

impl PassStats {
    pub(crate) fn compute(lines: usize, diffs: &[Diff], errors: usize, duration: Duration) -> Self {
        let mut stats = Self {
            lines,
            errors,
            duration,
            ..Self::default()
        };
        for diff in diffs {
            match diff {
                Diff::Create { .. } => stats.creates += 1,
                Diff::Delete { .. } => stats.deletes += 1,
                Diff::Change { .. } => stats.changes += 1,
            }
        }
        stats
    }
}

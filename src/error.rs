use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Line errors
// ---------------------------------------------------------------------------

/// Why a line of the listing could not be reconciled.
///
/// The `Display` text is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Malformed ID at start of line")]
    MalformedIdentifier,

    #[error("Parsing {0} failed")]
    ColumnParseFailure(String),

    #[error("No filename found")]
    MissingFilename,

    #[error("Filename cannot contain path separator")]
    FilenameContainsSeparator,

    #[error("Could not find existing entry (was the ID changed?)")]
    UnknownIdentifier,

    #[error("Duplicate filename")]
    DuplicateFilename,

    #[error("Paths cannot start with '/'")]
    LeadingSeparatorInPath,

    #[error("Cannot parse buffer '{0}': No adapter")]
    AdapterUnavailable(String),
}

impl ParseErrorKind {
    /// Fatal errors abort the whole pass. Everything else is line-scoped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AdapterUnavailable(_))
    }
}

impl Serialize for ParseErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A line-scoped reconciliation error.
///
/// `lnum` is zero-based. `col` is always 0: errors cover the whole line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub lnum: usize,
    pub col:  usize,
    #[serde(rename = "message")]
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn at(lnum: usize, kind: ParseErrorKind) -> Self {
        Self { lnum, col: 0, kind }
    }

    /// The user-facing message.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Errors raised by adapters and caches while gathering snapshot state.
///
/// The reconciliation pass itself never returns these; they surface when a
/// caller lists or refreshes a directory.
#[derive(Error, Debug)]
pub enum RelistError {
    #[error("permission denied")]
    PermissionDenied(PathBuf),

    #[error("path not found")]
    NotFound(PathBuf),

    #[error("unknown directory: {0}")]
    UnknownDirectory(String),

    // Config
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Third-party extensibility
    #[error("adapter error: {0}")]
    Adapter(String),
}

impl RelistError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether a listing can continue past this error.
    ///
    /// A single unreadable child is skipped; a missing directory is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::Io { .. })
    }
}

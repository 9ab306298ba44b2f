//! Built-in columns.
//!
//! Each column renders one attribute of a [`SnapshotEntry`] as a single
//! whitespace-delimited field and parses it back. Parsing consumes the field
//! plus the whitespace after it and hands the rest of the line to the next
//! column.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entry::SnapshotEntry;
use crate::traits::Column;

/// A parsed or stored column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnValue {
    /// Unix permission bits, including setuid/setgid/sticky.
    Mode(u32),

    /// Size in bytes. Approximate when parsed from a human-readable field.
    Size(u64),

    /// Seconds since the Unix epoch, UTC.
    Timestamp(i64),

    /// Free-form text for backend-specific columns.
    Text(String),

    /// The backend had no value for this column.
    Empty,
}

/// Placeholder rendered for attributes the backend did not capture.
const PLACEHOLDER: &str = "-";

/// Split off the next whitespace-delimited field.
///
/// The field must be followed by at least one whitespace character; a field
/// running to the end of the line would leave no room for the name.
pub(crate) fn split_field(rem: &str) -> Option<(&str, &str)> {
    let end = rem.find(char::is_whitespace)?;
    if end == 0 {
        return None;
    }
    let (field, rest) = rem.split_at(end);
    Some((field, rest.trim_start()))
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// `rwxr-xr-x` style permission bits. The only built-in column that can
/// produce a `Change` diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissions;

impl Permissions {
    pub const NAME: &'static str = "permissions";
}

/// (read, write, exec, special bit, special char when exec set, special char when exec unset)
const TRIADS: [(u32, u32, u32, u32, char, char); 3] = [
    (0o400, 0o200, 0o100, 0o4000, 's', 'S'),
    (0o040, 0o020, 0o010, 0o2000, 's', 'S'),
    (0o004, 0o002, 0o001, 0o1000, 't', 'T'),
];

pub(crate) fn format_mode(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for (r, w, x, special, set, unset) in TRIADS {
        out.push(if mode & r != 0 { 'r' } else { '-' });
        out.push(if mode & w != 0 { 'w' } else { '-' });
        out.push(match (mode & x != 0, mode & special != 0) {
            (true, true)   => set,
            (false, true)  => unset,
            (true, false)  => 'x',
            (false, false) => '-',
        });
    }
    out
}

pub(crate) fn parse_mode(text: &str) -> Option<u32> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() != 9 {
        return None;
    }
    let mut mode = 0;
    for (i, (r, w, x, special, set, unset)) in TRIADS.into_iter().enumerate() {
        match chars[i * 3] {
            'r' => mode |= r,
            '-' => {}
            _   => return None,
        }
        match chars[i * 3 + 1] {
            'w' => mode |= w,
            '-' => {}
            _   => return None,
        }
        match chars[i * 3 + 2] {
            'x' => mode |= x,
            '-' => {}
            c if c == set   => mode |= x | special,
            c if c == unset => mode |= special,
            _ => return None,
        }
    }
    Some(mode)
}

impl Column for Permissions {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parse<'a>(&self, rem: &'a str) -> Option<(ColumnValue, &'a str)> {
        let (field, rest) = split_field(rem)?;
        Some((ColumnValue::Mode(parse_mode(field)?), rest))
    }

    fn differs(&self, entry: &SnapshotEntry, value: &ColumnValue) -> bool {
        match (entry.attribute(Self::NAME), value) {
            (Some(ColumnValue::Mode(stored)), ColumnValue::Mode(parsed)) => {
                stored & 0o7777 != parsed & 0o7777
            }
            _ => false,
        }
    }

    fn format(&self, entry: &SnapshotEntry) -> String {
        match entry.attribute(Self::NAME) {
            Some(ColumnValue::Mode(mode)) => format_mode(*mode),
            _ => "---------".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// Human-readable size. Read-only: edits to this field are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Size;

impl Size {
    pub const NAME: &'static str = "size";
}

const UNITS: [(char, f64); 4] = [('T', 1e12), ('G', 1e9), ('M', 1e6), ('K', 1e3)];

pub(crate) fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    for (suffix, scale) in UNITS {
        if b >= scale {
            return format!("{:.1}{}", b / scale, suffix);
        }
    }
    bytes.to_string()
}

pub(crate) fn parse_size(text: &str) -> Option<u64> {
    if let Ok(n) = text.parse::<u64>() {
        return Some(n);
    }
    let suffix = text.chars().last()?;
    let (_, scale) = UNITS.iter().find(|(s, _)| *s == suffix)?;
    let number: f64 = text[..text.len() - suffix.len_utf8()].parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some((number * scale).round() as u64)
}

impl Column for Size {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parse<'a>(&self, rem: &'a str) -> Option<(ColumnValue, &'a str)> {
        let (field, rest) = split_field(rem)?;
        if field == PLACEHOLDER {
            return Some((ColumnValue::Empty, rest));
        }
        Some((ColumnValue::Size(parse_size(field)?), rest))
    }

    fn format(&self, entry: &SnapshotEntry) -> String {
        match entry.attribute(Self::NAME) {
            Some(ColumnValue::Size(bytes)) => format_size(*bytes),
            _ => PLACEHOLDER.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mtime
// ---------------------------------------------------------------------------

/// Modification time as `YYYY-MM-DD HH:MM` (UTC). Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mtime;

impl Mtime {
    pub const NAME: &'static str = "mtime";
    const FORMAT: &'static str = "%Y-%m-%d %H:%M";
}

impl Column for Mtime {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parse<'a>(&self, rem: &'a str) -> Option<(ColumnValue, &'a str)> {
        let (date, rest) = split_field(rem)?;
        if date == PLACEHOLDER {
            return Some((ColumnValue::Empty, rest));
        }
        let (time, rest) = split_field(rest)?;
        let parsed = NaiveDateTime::parse_from_str(&format!("{date} {time}"), Self::FORMAT).ok()?;
        Some((ColumnValue::Timestamp(parsed.and_utc().timestamp()), rest))
    }

    fn format(&self, entry: &SnapshotEntry) -> String {
        match entry.attribute(Self::NAME) {
            Some(ColumnValue::Timestamp(secs)) => DateTime::from_timestamp(*secs, 0)
                .map(|t| t.format(Self::FORMAT).to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            _ => PLACEHOLDER.to_string(),
        }
    }
}

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use ignore::{DirEntry, WalkBuilder};
use tracing::warn;

use crate::columns::{ColumnValue, Mtime, Permissions, Size};
use crate::entry::{EntryMeta, EntryType, ListedEntry};
use crate::error::RelistError;
use crate::traits::{Adapter, Column};

// ---------------------------------------------------------------------------
// LocalAdapter
// ---------------------------------------------------------------------------

/// Lists directories on local disk.
///
/// Only the immediate children are read. Nothing is filtered here: hidden
/// files and ignore files are the [`Visibility`](crate::traits::Visibility)
/// policy's business, and symlinks are reported as links, never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAdapter;

impl LocalAdapter {
    /// URL scheme this adapter is registered under by default.
    pub const SCHEME: &'static str = "file://";
}

impl Adapter for LocalAdapter {
    fn name(&self) -> &str {
        "files"
    }

    fn supported_columns(&self) -> Vec<Arc<dyn Column>> {
        vec![Arc::new(Permissions), Arc::new(Size), Arc::new(Mtime)]
    }

    fn list(&self, dir: &str) -> Result<Vec<ListedEntry>, RelistError> {
        let root = PathBuf::from(dir);
        match fs::metadata(&root) {
            Ok(md) if md.is_dir() => {}
            Ok(_) => return Err(RelistError::NotFound(root)),
            Err(e) => return Err(map_io_error(root, e)),
        }

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .ignore(false)
            .parents(false)
            .hidden(false)
            .follow_links(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut listed = Vec::new();
        for res in walker {
            let entry = match res {
                Ok(e) => e,
                Err(e) => {
                    let err = map_ignore_error(e);
                    if err.is_recoverable() {
                        warn!(error = %err, path = ?err.path(), "skipping unreadable entry");
                        continue;
                    }
                    return Err(err);
                }
            };

            // Skip the root itself
            if entry.depth() == 0 {
                continue;
            }

            match listed_entry(&entry) {
                Ok(l) => listed.push(l),
                Err(e) => warn!(error = %e, path = %entry.path().display(), "skipping entry"),
            }
        }
        Ok(listed)
    }
}

// ---------------------------------------------------------------------------
// DirEntry → ListedEntry
// ---------------------------------------------------------------------------

fn listed_entry(entry: &DirEntry) -> Result<ListedEntry, RelistError> {
    let path = entry.path();
    let md = fs::symlink_metadata(path).map_err(|e| map_io_error(path.to_path_buf(), e))?;
    let ft = md.file_type();

    let entry_type = if ft.is_dir() {
        EntryType::Directory
    } else if ft.is_file() {
        EntryType::File
    } else if ft.is_symlink() {
        EntryType::Link
    } else {
        EntryType::Other(special_kind(&ft).to_string())
    };

    let mut meta = EntryMeta::default()
        .with_attribute(Size::NAME, ColumnValue::Size(md.len()));

    if let Some(mode) = mode_of(&md) {
        meta = meta.with_attribute(Permissions::NAME, ColumnValue::Mode(mode));
    }
    if let Some(secs) = md
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
    {
        meta = meta.with_attribute(Mtime::NAME, ColumnValue::Timestamp(secs.as_secs() as i64));
    }
    if entry_type == EntryType::Link {
        let target = fs::read_link(path).map_err(|e| map_io_error(path.to_path_buf(), e))?;
        meta = meta.with_link(target.to_string_lossy().into_owned());
    }

    Ok(ListedEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        entry_type,
        meta: Some(meta),
    })
}

#[cfg(unix)]
fn mode_of(md: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(md.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_md: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn special_kind(ft: &fs::FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;
    if ft.is_socket() {
        "socket"
    } else if ft.is_fifo() {
        "fifo"
    } else if ft.is_block_device() {
        "blockdev"
    } else if ft.is_char_device() {
        "chardev"
    } else {
        "other"
    }
}

#[cfg(not(unix))]
fn special_kind(_ft: &fs::FileType) -> &'static str {
    "other"
}

// ---------------------------------------------------------------------------
// Map errors to RelistError
// ---------------------------------------------------------------------------

fn map_io_error(path: PathBuf, e: io::Error) -> RelistError {
    match e.kind() {
        io::ErrorKind::NotFound         => RelistError::NotFound(path),
        io::ErrorKind::PermissionDenied => RelistError::PermissionDenied(path),
        _                               => RelistError::Io { path, source: e },
    }
}

fn map_ignore_error(e: ignore::Error) -> RelistError {
    match e {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(io_err) => map_io_error(path, io_err),
            other => RelistError::Adapter(format!("{}: {}", path.display(), other)),
        },
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err),
        ignore::Error::Io(io_err) => map_io_error(PathBuf::new(), io_err),
        other => RelistError::Adapter(other.to_string()),
    }
}

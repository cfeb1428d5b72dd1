//! Filesystem operations behind the shell commands.
//!
//! Every function takes already-resolved paths and re-reads the filesystem on each call;
//! nothing is cached between commands.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("File"),
            EntryKind::Directory => f.write_str("Directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Raw `st_size`; for directories this is whatever the filesystem reports, not a total.
    pub size: u64,
    /// Seconds since the Unix epoch, if the platform exposes a modification time.
    pub modified: Option<u64>,
}

/// Lists `dir`, sorted by entry name.
pub fn list_dir(dir: &Path) -> FsResult<Vec<DirEntryInfo>> {
    let entries = fs::read_dir(dir).map_err(|err| FsError::io("read", dir, err))?;

    let mut listing = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| FsError::io("read", dir, err))?;
        // Follows symlinks so a link to a directory lists as one.
        let kind = if entry.path().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        listing.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
        });
    }

    listing.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listing)
}

/// Creates exactly one directory level.
pub fn create_dir(path: &Path) -> FsResult<()> {
    fs::create_dir(path).map_err(|err| FsError::io("create directory", path, err))?;
    info!(path = %path.display(), "created directory");
    Ok(())
}

/// Creates an empty file, truncating any existing one.
pub fn create_file(path: &Path) -> FsResult<()> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| FsError::io("create file", path, err))?;
    info!(path = %path.display(), "created file");
    Ok(())
}

/// Removes a file, or a directory together with everything beneath it.
pub fn remove(path: &Path) -> FsResult<()> {
    let metadata = existing(path)?;

    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(|err| FsError::io("delete", path, err))?;
    } else {
        fs::remove_file(path).map_err(|err| FsError::io("delete", path, err))?;
    }

    info!(path = %path.display(), "deleted");
    Ok(())
}

/// Copies a file (overwriting `dest`) or a whole directory tree into `dest`.
///
/// A failure part way through a tree copy leaves whatever was already copied in place.
pub fn copy(src: &Path, dest: &Path) -> FsResult<()> {
    let metadata = fs::metadata(src).map_err(|err| FsError::from_io("copy", src, err))?;

    if metadata.is_dir() {
        copy_tree(src, dest)?;
    } else {
        fs::copy(src, dest).map_err(|err| FsError::io("copy", src, err))?;
    }

    info!(src = %src.display(), dest = %dest.display(), "copied");
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> FsResult<()> {
    let src_canonical = fs::canonicalize(src).map_err(|err| FsError::io("resolve", src, err))?;
    if absolute_target(dest)?.starts_with(&src_canonical) {
        return Err(FsError::InvalidOperation {
            path: dest.to_path_buf(),
            reason: "cannot copy a directory into itself".to_string(),
        });
    }

    // Links are followed so a linked directory is copied as a directory; walkdir reports loops.
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|err| walk_error("copy", src, err))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| FsError::InvalidOperation {
                path: entry.path().to_path_buf(),
                reason: "entry escaped the source tree".to_string(),
            })?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|err| FsError::io("create directory", &target, err))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|err| FsError::io("copy", entry.path(), err))?;
        }
        debug!(from = %entry.path().display(), to = %target.display(), "copied entry");
    }

    Ok(())
}

/// Renames `src` to `dest` with the native rename primitive.
///
/// Moves across filesystem volumes are not supported and surface as an I/O error.
pub fn rename(src: &Path, dest: &Path) -> FsResult<()> {
    existing(src)?;
    fs::rename(src, dest).map_err(|err| FsError::io("move", src, err))?;
    info!(src = %src.display(), dest = %dest.display(), "moved");
    Ok(())
}

pub fn file_info(path: &Path) -> FsResult<FileInfo> {
    let metadata = fs::metadata(path).map_err(|err| FsError::from_io("inspect", path, err))?;

    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| since.as_secs());

    Ok(FileInfo {
        path: path.to_path_buf(),
        kind,
        size: metadata.len(),
        modified,
    })
}

/// Lazily walks every descendant of `root`, yielding the full path of each entry whose
/// final component contains `needle`.
///
/// Unreadable subtrees come out as `Err` items and the walk carries on past them.
pub fn search(root: &Path, needle: &str) -> Search {
    Search {
        walker: WalkDir::new(root).min_depth(1).into_iter(),
        needle: needle.to_string(),
    }
}

pub struct Search {
    walker: walkdir::IntoIter,
    needle: String,
}

impl Iterator for Search {
    type Item = FsResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if entry.file_name().to_string_lossy().contains(&self.needle) {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                    return Some(Err(walk_error("read", &path, err)));
                }
            }
        }
    }
}

fn existing(path: &Path) -> FsResult<fs::Metadata> {
    fs::symlink_metadata(path).map_err(|err| FsError::from_io("inspect", path, err))
}

fn walk_error(action: &'static str, fallback: &Path, err: walkdir::Error) -> FsError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    let source = match err.into_io_error() {
        Some(source) => source,
        None => io::Error::other("filesystem loop detected"),
    };
    FsError::io(action, path, source)
}

/// Absolute form of a path that may not exist yet.
fn absolute_target(path: &Path) -> FsResult<PathBuf> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Ok(canonical);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent =
                fs::canonicalize(parent).map_err(|err| FsError::from_io("resolve", parent, err))?;
            Ok(parent.join(name))
        }
        _ => Err(FsError::InvalidOperation {
            path: path.to_path_buf(),
            reason: "not a valid destination".to_string(),
        }),
    }
}

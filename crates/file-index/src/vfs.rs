//! Directory-entry abstraction over the underlying filesystem.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::types::{DirEntry, FileType};

/// Enumerates directory children for the index walker.
///
/// Implementations report entries in the order the index should visit them.
/// An enumeration failure surfaces as an error; the walker skips that branch
/// and continues with siblings.
pub trait Vfs: Send + Sync {
    fn list_children(&self, dir: &Path) -> Result<Vec<DirEntry>>;
}

/// `std::fs`-backed [`Vfs`].
///
/// Children are sorted by name so traversal order is deterministic across
/// platforms. Entries whose metadata cannot be read are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsVfs;

impl Vfs for OsVfs {
    fn list_children(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut children: Vec<DirEntry> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_type = entry.file_type().ok()?;
                let kind = if file_type.is_file() {
                    FileType::File
                } else if file_type.is_dir() {
                    FileType::Directory
                } else if file_type.is_symlink() {
                    FileType::Symlink
                } else {
                    FileType::Other
                };
                let name = entry.file_name().to_string_lossy().into_owned();
                Some(DirEntry::new(name, entry.path(), kind))
            })
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

/// In-memory [`Vfs`] for tests: a map of directory paths to their children,
/// with selected directories made unreadable to exercise error skipping.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FakeVfs {
    dirs: std::collections::HashMap<std::path::PathBuf, Vec<DirEntry>>,
    unreadable: Vec<std::path::PathBuf>,
}

#[cfg(test)]
impl FakeVfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, path: impl Into<std::path::PathBuf>, entries: Vec<DirEntry>) {
        self.dirs.insert(path.into(), entries);
    }

    pub fn mark_unreadable(&mut self, path: impl Into<std::path::PathBuf>) {
        self.unreadable.push(path.into());
    }
}

#[cfg(test)]
impl Vfs for FakeVfs {
    fn list_children(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        use crate::error::IndexError;
        use std::io;

        if self.unreadable.iter().any(|path| path == dir) {
            return Err(IndexError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("unreadable directory: {}", dir.display()),
            )));
        }
        self.dirs.get(dir).cloned().ok_or_else(|| {
            IndexError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ))
        })
    }
}

//! Core entry, record, and status types for the file index.

use std::path::{Path, PathBuf};

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Other,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }

    pub fn is_file(self) -> bool {
        self == Self::File
    }

    pub fn is_directory(self) -> bool {
        self == Self::Directory
    }
}

/// A raw directory entry as reported by the [`Vfs`](crate::vfs::Vfs).
///
/// Index filters are evaluated against entries at traversal time, not against
/// the records built from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Base name of the entry.
    pub name: String,
    /// Full path to the entry.
    pub path: PathBuf,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            file_type,
        }
    }

    /// Creates a file entry, deriving the name from the path's last component.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = base_name(&path);
        Self::new(name, path, FileType::File)
    }

    /// Creates a directory entry, deriving the name from the path's last component.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = base_name(&path);
        Self::new(name, path, FileType::Directory)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One discovered file.
///
/// Immutable once constructed. A single record is shared (by `Arc`) across
/// every index whose filter accepted the entry in the same traversal pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    name: String,
    full_path: PathBuf,
}

impl FileRecord {
    pub(crate) fn from_entry(entry: &DirEntry) -> Self {
        Self {
            name: entry.name.clone(),
            full_path: entry.path.clone(),
        }
    }

    /// Base filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path to the file.
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }
}

/// Outcome of a [`sync`](crate::manager::FileIndexManager::sync) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Indexes were already current; nothing was rebuilt.
    Clean,
    /// A full rebuild ran.
    Rebuilt(SyncReport),
}

/// Totals from one rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Files visited (and classified) during the walk.
    pub files: usize,
    /// Directories entered during the walk.
    pub dirs: usize,
    /// Unreadable branches skipped during the walk.
    pub errors: usize,
    /// True when the file-count ceiling aborted the walk early.
    pub truncated: bool,
}

/// Snapshot of manager state, for status surfaces and diagnostics.
#[derive(Debug, Clone)]
pub struct IndexStatus {
    /// Current sync state.
    pub state: String,
    /// Whether the cache is stale.
    pub dirty: bool,
    /// Root path currently supplied by the root provider.
    pub root: Option<PathBuf>,
    /// Count of full rebuilds performed.
    pub rebuild_count: u64,
    /// Files scanned by the last rebuild.
    pub scanned_files: usize,
    /// Directories scanned by the last rebuild.
    pub scanned_dirs: usize,
    /// Unreadable branches skipped by the last rebuild.
    pub errors: usize,
    /// Whether the last rebuild hit the file-count ceiling.
    pub truncated: bool,
    /// Unix timestamp when the last rebuild started.
    pub started_at: Option<u64>,
    /// Unix timestamp when the last rebuild finished.
    pub finished_at: Option<u64>,
    /// Registered index names with their record counts.
    pub indexes: Vec<IndexCounts>,
}

/// Record count for one named index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCounts {
    pub name: String,
    pub records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_constructors_derive_base_name() {
        let file = DirEntry::file("/project/src/main.rs");
        assert_eq!(file.name, "main.rs");
        assert!(file.file_type.is_file());

        let dir = DirEntry::directory("/project/src");
        assert_eq!(dir.name, "src");
        assert!(dir.file_type.is_directory());
    }

    #[test]
    fn record_copies_entry_metadata() {
        let entry = DirEntry::file("/project/styles/theme.css");
        let record = FileRecord::from_entry(&entry);
        assert_eq!(record.name(), "theme.css");
        assert_eq!(record.full_path(), Path::new("/project/styles/theme.css"));
    }
}

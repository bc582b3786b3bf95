//! Recursive traversal over the virtual filesystem.
//!
//! The walk is depth-first; within a directory entries are visited in the
//! order the [`Vfs`] reports them. Every discovered file is classified
//! against every registered index in the same pass.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{IndexError, Result};
use crate::registry::IndexRegistry;
use crate::types::FileType;
use crate::vfs::Vfs;

/// Live counters for the current or most recent walk (atomic so status
/// reads never take the registry lock).
#[derive(Debug, Default)]
pub(crate) struct WalkProgress {
    pub files: AtomicUsize,
    pub dirs: AtomicUsize,
    pub errors: AtomicUsize,
    pub started_at: AtomicU64,
    pub finished_at: AtomicU64,
}

impl WalkProgress {
    /// Resets counters for a new rebuild.
    pub fn reset(&self, started_at: u64) {
        self.files.store(0, Ordering::Relaxed);
        self.dirs.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.started_at.store(started_at, Ordering::Relaxed);
        self.finished_at.store(0, Ordering::Relaxed);
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.files.load(Ordering::Relaxed),
            self.dirs.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

/// One traversal pass over the tree rooted at a project directory.
pub(crate) struct Walker<'a, V: Vfs> {
    vfs: &'a V,
    registry: &'a mut IndexRegistry,
    progress: &'a WalkProgress,
    ignored_roots: &'a [PathBuf],
    max_files: usize,
}

impl<'a, V: Vfs> Walker<'a, V> {
    pub fn new(
        vfs: &'a V,
        registry: &'a mut IndexRegistry,
        progress: &'a WalkProgress,
        ignored_roots: &'a [PathBuf],
        max_files: usize,
    ) -> Self {
        Self {
            vfs,
            registry,
            progress,
            ignored_roots,
            max_files,
        }
    }

    /// Walks `root` depth-first, appending matching records as files are
    /// discovered. Stops with `TraversalLimitExceeded` once visiting another
    /// file would pass the ceiling.
    pub fn run(mut self, root: &Path) -> Result<()> {
        self.walk_dir(root)
    }

    fn walk_dir(&mut self, dir: &Path) -> Result<()> {
        let children = match self.vfs.list_children(dir) {
            Ok(children) => children,
            Err(error) => {
                // Unreadable branch: skip it, keep walking siblings.
                self.progress.errors.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "file index: skipping unreadable directory {}: {error}",
                    dir.display()
                );
                return Ok(());
            }
        };
        self.progress.dirs.fetch_add(1, Ordering::Relaxed);

        for entry in children {
            if path_is_ignored(self.ignored_roots, &entry.path) {
                continue;
            }
            match entry.file_type {
                FileType::Directory => self.walk_dir(&entry.path)?,
                FileType::File => {
                    if self.progress.files.load(Ordering::Relaxed) >= self.max_files {
                        return Err(IndexError::TraversalLimitExceeded {
                            limit: self.max_files,
                        });
                    }
                    self.progress.files.fetch_add(1, Ordering::Relaxed);
                    self.registry.add_file(&entry);
                }
                // Symlinks and special files are neither indexed nor followed.
                FileType::Symlink | FileType::Other => {}
            }
        }
        Ok(())
    }
}

/// Checks if a path falls under any ignored root.
fn path_is_ignored(ignored_roots: &[PathBuf], candidate: &Path) -> bool {
    ignored_roots
        .iter()
        .any(|ignored| candidate == ignored || candidate.starts_with(ignored))
}

//! External collaborator contracts: project root and limit notification.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Supplies the current project root.
pub trait RootProvider: Send + Sync {
    /// Returns the root directory to index, or `None` when no project is open.
    fn project_root(&self) -> Option<PathBuf>;
}

/// Receives the signal that a rebuild hit the file-count ceiling.
///
/// Presentation of the condition (dialog, metric, log line) is the
/// implementor's concern; the engine only stops walking and signals once.
pub trait TraversalLimitNotifier: Send + Sync {
    fn limit_exceeded(&self, root: &Path, limit: usize);
}

/// Root provider holding a settable path; the embedder swaps it on project
/// switches.
#[derive(Debug, Default)]
pub struct StaticRootProvider {
    root: RwLock<Option<PathBuf>>,
}

impl StaticRootProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: RwLock::new(Some(root.into())),
        }
    }

    /// Creates a provider with no open project.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the current root. Callers mark the manager dirty (or call
    /// `handle_root_changed`) after switching.
    pub fn set_root(&self, root: Option<PathBuf>) {
        *self.root.write() = root;
    }
}

impl RootProvider for StaticRootProvider {
    fn project_root(&self) -> Option<PathBuf> {
        self.root.read().clone()
    }
}

/// Default notifier that records the ceiling at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLimitNotifier;

impl TraversalLimitNotifier for LogLimitNotifier {
    fn limit_exceeded(&self, root: &Path, limit: usize) {
        log::warn!(
            "file index truncated: more than {limit} files under {}",
            root.display()
        );
    }
}

//! FileIndexManager - dirty-tracked index cache over a project tree.
//!
//! The manager trades eager traversal for on-demand rebuilding: any
//! invalidation sets one dirty flag over the whole registry, and the next
//! read rebuilds every index in a single depth-first pass before answering.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::{IndexError, Result};
use crate::filter::IndexFilter;
use crate::provider::{LogLimitNotifier, RootProvider, TraversalLimitNotifier};
use crate::registry::IndexRegistry;
use crate::types::{FileRecord, IndexStatus, SyncOutcome, SyncReport};
use crate::vfs::Vfs;
use crate::walker::{WalkProgress, Walker};

/// Default ceiling on files visited in one rebuild.
pub const DEFAULT_MAX_FILES: usize = 10_000;

/// Sync state (atomic for lock-free status reads).
///
/// Distinct from the dirty flag: `Syncing` marks an in-flight rebuild so a
/// status read can tell "stale" from "being rebuilt right now".
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum SyncState {
    Idle = 0,
    Syncing = 1,
    Ready = 2,
}

impl SyncState {
    /// Loads the state from an atomic.
    pub fn load(atomic: &AtomicU8) -> Self {
        match atomic.load(Ordering::Relaxed) {
            1 => Self::Syncing,
            2 => Self::Ready,
            _ => Self::Idle,
        }
    }

    /// Returns the state as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Ready => "ready",
        }
    }
}

/// Configuration for a manager instance.
#[derive(Debug, Clone)]
pub struct IndexManagerConfig {
    /// Ceiling on files visited per rebuild; the walk aborts past it.
    pub max_files: usize,
    /// Subtrees pruned from every walk.
    pub ignored_roots: Vec<PathBuf>,
}

impl Default for IndexManagerConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            ignored_roots: Vec::new(),
        }
    }
}

/// Named, lazily-rebuilt file indexes over a project directory tree.
///
/// All state is owned by the instance; independent managers never share
/// anything, which keeps tests and multi-window embedders isolated.
pub struct FileIndexManager<V: Vfs> {
    vfs: V,
    root_provider: Arc<dyn RootProvider>,
    limit_notifier: Arc<dyn TraversalLimitNotifier>,
    config: IndexManagerConfig,
    registry: Mutex<IndexRegistry>,
    /// Stale marker; starts true so the first read performs the initial walk.
    dirty: AtomicBool,
    state: AtomicU8,
    progress: WalkProgress,
    rebuild_count: AtomicU64,
    truncated: AtomicBool,
}

impl<V: Vfs> std::fmt::Debug for FileIndexManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIndexManager")
            .field("dirty", &self.dirty.load(Ordering::Relaxed))
            .field("state", &SyncState::load(&self.state))
            .field("rebuild_count", &self.rebuild_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<V: Vfs> FileIndexManager<V> {
    /// Creates a manager with the built-in `"all"` and `"css"` indexes, the
    /// default config, and a warn-level limit notifier.
    pub fn new(vfs: V, root_provider: Arc<dyn RootProvider>) -> Self {
        Self::with_config(
            vfs,
            root_provider,
            Arc::new(LogLimitNotifier),
            IndexManagerConfig::default(),
        )
    }

    pub fn with_config(
        vfs: V,
        root_provider: Arc<dyn RootProvider>,
        limit_notifier: Arc<dyn TraversalLimitNotifier>,
        config: IndexManagerConfig,
    ) -> Self {
        Self {
            vfs,
            root_provider,
            limit_notifier,
            config,
            registry: Mutex::new(IndexRegistry::with_builtins()),
            dirty: AtomicBool::new(true),
            state: AtomicU8::new(SyncState::Idle as u8),
            progress: WalkProgress::default(),
            rebuild_count: AtomicU64::new(0),
            truncated: AtomicBool::new(false),
        }
    }

    /// Registers a new named index.
    ///
    /// The whole cache is invalidated so the next sync populates the new
    /// view alongside the existing ones.
    pub fn register_index(&self, name: &str, filter: IndexFilter) -> Result<()> {
        self.registry.lock().register(name, filter)?;
        self.mark_dirty();
        Ok(())
    }

    /// Marks every index stale. Idempotent; the next read rebuilds.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Invalidates and rebuilds immediately.
    ///
    /// Call on project-root change notifications so the first query after a
    /// switch is served from a fresh walk.
    pub fn handle_root_changed(&self) -> SyncOutcome {
        self.mark_dirty();
        self.sync()
    }

    /// Rebuilds every index when stale; O(1) no-op otherwise.
    ///
    /// The rebuild runs under the registry lock: at most one rebuild is ever
    /// in flight, and readers queue behind it, observing either the pre-sync
    /// or the fully rebuilt lists, never a partial rebuild.
    pub fn sync(&self) -> SyncOutcome {
        if !self.dirty.load(Ordering::SeqCst) {
            return SyncOutcome::Clean;
        }
        let mut registry = self.registry.lock();
        self.sync_locked(&mut registry)
    }

    fn sync_locked(&self, registry: &mut IndexRegistry) -> SyncOutcome {
        // A rebuild that finished while we waited for the lock already
        // served this invalidation.
        if !self.dirty.load(Ordering::SeqCst) {
            log::debug!("file index sync: already current");
            return SyncOutcome::Clean;
        }
        SyncOutcome::Rebuilt(self.rebuild(registry))
    }

    fn rebuild(&self, registry: &mut IndexRegistry) -> SyncReport {
        let started = Instant::now();
        self.state.store(SyncState::Syncing as u8, Ordering::Relaxed);
        self.progress.reset(unix_now_secs());
        registry.clear_records();

        let root = self.root_provider.project_root();
        let mut truncated = false;
        if let Some(root) = root.as_deref() {
            let walker = Walker::new(
                &self.vfs,
                registry,
                &self.progress,
                &self.config.ignored_roots,
                self.config.max_files,
            );
            if let Err(error) = walker.run(root) {
                match error {
                    IndexError::TraversalLimitExceeded { limit } => {
                        truncated = true;
                        self.limit_notifier.limit_exceeded(root, limit);
                    }
                    other => {
                        // Per-branch walk errors are skipped in place; anything
                        // else still terminates this cycle with partial lists.
                        log::warn!("file index rebuild stopped early: {other}");
                    }
                }
            }
        }
        // No root means nothing to index, not an error: the walk is skipped
        // and the cache is consistently empty.

        let (files, dirs, errors) = self.progress.counts();
        self.progress
            .finished_at
            .store(unix_now_secs(), Ordering::Relaxed);
        self.truncated.store(truncated, Ordering::Relaxed);
        self.rebuild_count.fetch_add(1, Ordering::Relaxed);

        // Terminal for this cycle whether the walk completed or hit the
        // ceiling; a later query must not re-trigger a redundant rebuild.
        self.dirty.store(false, Ordering::SeqCst);
        self.state.store(SyncState::Ready as u8, Ordering::Relaxed);

        log::info!(
            "file index rebuilt root={} files={} dirs={} errors={} truncated={} elapsed_ms={}",
            root.as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
            files,
            dirs,
            errors,
            truncated,
            started.elapsed().as_millis(),
        );

        SyncReport {
            files,
            dirs,
            errors,
            truncated,
        }
    }

    /// Returns a snapshot of the named index's records, rebuilding first if
    /// the cache is stale.
    pub fn records(&self, name: &str) -> Result<Vec<Arc<FileRecord>>> {
        let mut registry = self.registry.lock();
        self.sync_locked(&mut registry);
        Ok(registry.get(name)?.records().to_vec())
    }

    /// Returns records from the named index whose file name satisfies the
    /// caller predicate. The underlying index is not mutated.
    pub fn filtered_records(
        &self,
        name: &str,
        predicate: impl Fn(&str) -> bool,
    ) -> Result<Vec<Arc<FileRecord>>> {
        let mut registry = self.registry.lock();
        self.sync_locked(&mut registry);
        Ok(registry
            .get(name)?
            .records()
            .iter()
            .filter(|record| predicate(record.name()))
            .cloned()
            .collect())
    }

    /// Returns every record in the named index whose file name equals
    /// `filename` exactly. Duplicate filenames at different paths are legal
    /// and all matches are returned in traversal order.
    pub fn records_by_name(&self, name: &str, filename: &str) -> Result<Vec<Arc<FileRecord>>> {
        self.filtered_records(name, |candidate| candidate == filename)
    }

    /// Returns a status snapshot without forcing a rebuild.
    pub fn status(&self) -> IndexStatus {
        let registry = self.registry.lock();
        let (files, dirs, errors) = self.progress.counts();
        IndexStatus {
            state: SyncState::load(&self.state).as_str().to_string(),
            dirty: self.dirty.load(Ordering::SeqCst),
            root: self.root_provider.project_root(),
            rebuild_count: self.rebuild_count.load(Ordering::Relaxed),
            scanned_files: files,
            scanned_dirs: dirs,
            errors,
            truncated: self.truncated.load(Ordering::Relaxed),
            started_at: zero_to_none(self.progress.started_at.load(Ordering::Relaxed)),
            finished_at: zero_to_none(self.progress.finished_at.load(Ordering::Relaxed)),
            indexes: registry.counts(),
        }
    }
}

/// Returns the current Unix timestamp in seconds.
fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

/// Converts 0 to None for optional timestamps.
fn zero_to_none(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    use tempfile::TempDir;

    use crate::provider::StaticRootProvider;
    use crate::registry::{ALL_FILES_INDEX, CSS_FILES_INDEX};
    use crate::types::DirEntry;
    use crate::vfs::{FakeVfs, OsVfs};

    #[derive(Debug, Default)]
    struct CountingNotifier {
        hits: AtomicUsize,
    }

    impl TraversalLimitNotifier for CountingNotifier {
        fn limit_exceeded(&self, _root: &Path, _limit: usize) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fake_project() -> FakeVfs {
        let mut vfs = FakeVfs::new();
        vfs.add_dir(
            "/proj",
            vec![
                DirEntry::directory("/proj/a"),
                DirEntry::directory("/proj/b"),
                DirEntry::file("/proj/main.js"),
                DirEntry::file("/proj/reset.CSS"),
                DirEntry::file("/proj/theme.css"),
            ],
        );
        vfs.add_dir("/proj/a", vec![DirEntry::file("/proj/a/style.css")]);
        vfs.add_dir("/proj/b", vec![DirEntry::file("/proj/b/style.css")]);
        vfs
    }

    fn manager_over(vfs: FakeVfs) -> FileIndexManager<FakeVfs> {
        FileIndexManager::new(vfs, Arc::new(StaticRootProvider::new("/proj")))
    }

    fn paths(records: &[Arc<FileRecord>]) -> Vec<String> {
        records
            .iter()
            .map(|record| record.full_path().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn first_read_performs_initial_walk() {
        let manager = manager_over(fake_project());
        assert!(manager.status().dirty);

        let all = manager.records(ALL_FILES_INDEX).unwrap();
        assert_eq!(
            paths(&all),
            vec![
                "/proj/a/style.css",
                "/proj/b/style.css",
                "/proj/main.js",
                "/proj/reset.CSS",
                "/proj/theme.css",
            ]
        );
        assert!(!manager.status().dirty);
        assert_eq!(manager.status().state, "ready");
    }

    #[test]
    fn css_index_extension_match_is_case_sensitive() {
        let manager = manager_over(fake_project());
        let css = manager.records(CSS_FILES_INDEX).unwrap();
        let names: Vec<&str> = css.iter().map(|record| record.name()).collect();
        assert_eq!(names, vec!["style.css", "style.css", "theme.css"]);
        assert!(!names.contains(&"reset.CSS"));
    }

    #[test]
    fn records_satisfy_their_index_filter_after_sync() {
        let manager = manager_over(fake_project());
        let css = manager.records(CSS_FILES_INDEX).unwrap();
        let filter = IndexFilter::ExtensionEquals(".css".to_string());
        for record in &css {
            let entry = DirEntry::file(record.full_path());
            assert!(filter.matches(&entry), "{} fails its filter", record.name());
        }
    }

    #[test]
    fn sync_twice_is_a_noop() {
        let manager = manager_over(fake_project());
        assert!(matches!(manager.sync(), SyncOutcome::Rebuilt(_)));
        let first = manager.records(ALL_FILES_INDEX).unwrap();

        assert_eq!(manager.sync(), SyncOutcome::Clean);
        let second = manager.records(ALL_FILES_INDEX).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            // No rebuild happened, so the records are the same instances.
            assert!(Arc::ptr_eq(a, b));
        }
        assert_eq!(manager.status().rebuild_count, 1);
    }

    #[test]
    fn mark_dirty_forces_a_fresh_rebuild() {
        let manager = manager_over(fake_project());
        manager.sync();
        manager.mark_dirty();
        assert!(matches!(manager.sync(), SyncOutcome::Rebuilt(_)));
        assert_eq!(manager.status().rebuild_count, 2);
    }

    #[test]
    fn registering_an_index_after_sync_repopulates_consistently() {
        let manager = manager_over(fake_project());
        let all_before = manager.records(ALL_FILES_INDEX).unwrap();

        manager
            .register_index("js", IndexFilter::ExtensionEquals(".js".to_string()))
            .unwrap();
        assert!(manager.status().dirty);

        let js = manager.records("js").unwrap();
        assert_eq!(paths(&js), vec!["/proj/main.js"]);

        // Pre-existing indexes were recomputed but their content is unchanged.
        let all_after = manager.records(ALL_FILES_INDEX).unwrap();
        assert_eq!(paths(&all_before), paths(&all_after));
        assert_eq!(manager.status().rebuild_count, 2);
    }

    #[test]
    fn duplicate_and_invalid_registrations_fail_fast() {
        let manager = manager_over(fake_project());
        assert!(matches!(
            manager.register_index(ALL_FILES_INDEX, IndexFilter::AcceptAll),
            Err(IndexError::DuplicateIndex(_))
        ));
        assert!(matches!(
            manager.register_index("bad", IndexFilter::ExtensionEquals(String::new())),
            Err(IndexError::InvalidFilter(_))
        ));
    }

    #[test]
    fn unknown_index_query_fails() {
        let manager = manager_over(fake_project());
        assert!(matches!(
            manager.records("nope"),
            Err(IndexError::UnknownIndex(name)) if name == "nope"
        ));
    }

    #[test]
    fn records_by_name_returns_all_matches_in_discovery_order() {
        let manager = manager_over(fake_project());
        let matches = manager
            .records_by_name(ALL_FILES_INDEX, "style.css")
            .unwrap();
        assert_eq!(paths(&matches), vec!["/proj/a/style.css", "/proj/b/style.css"]);
    }

    #[test]
    fn filtered_records_does_not_mutate_the_index() {
        let manager = manager_over(fake_project());
        let css_only = manager
            .filtered_records(ALL_FILES_INDEX, |name| name.ends_with(".css"))
            .unwrap();
        assert_eq!(css_only.len(), 3);
        assert_eq!(manager.records(ALL_FILES_INDEX).unwrap().len(), 5);
    }

    #[test]
    fn no_root_yields_empty_indexes_and_clean_state() {
        let manager =
            FileIndexManager::new(FakeVfs::new(), Arc::new(StaticRootProvider::empty()));
        assert!(matches!(manager.sync(), SyncOutcome::Rebuilt(report) if report.files == 0));
        assert!(manager.records(ALL_FILES_INDEX).unwrap().is_empty());
        assert!(!manager.status().dirty);
    }

    #[test]
    fn root_change_triggers_an_immediate_rebuild() {
        let mut vfs = FakeVfs::new();
        vfs.add_dir("/old", vec![DirEntry::file("/old/a.txt")]);
        vfs.add_dir("/new", vec![DirEntry::file("/new/b.txt")]);

        let provider = Arc::new(StaticRootProvider::new("/old"));
        let manager = FileIndexManager::new(vfs, provider.clone());
        assert_eq!(
            paths(&manager.records(ALL_FILES_INDEX).unwrap()),
            vec!["/old/a.txt"]
        );

        provider.set_root(Some(PathBuf::from("/new")));
        assert!(matches!(manager.handle_root_changed(), SyncOutcome::Rebuilt(_)));
        assert_eq!(
            paths(&manager.records(ALL_FILES_INDEX).unwrap()),
            vec!["/new/b.txt"]
        );
    }

    #[test]
    fn ceiling_notifies_once_and_still_clears_dirty() {
        let mut vfs = FakeVfs::new();
        let entries: Vec<DirEntry> = (0..=DEFAULT_MAX_FILES)
            .map(|n| DirEntry::file(format!("/proj/file{n:05}.txt")))
            .collect();
        assert_eq!(entries.len(), DEFAULT_MAX_FILES + 1);
        vfs.add_dir("/proj", entries);

        let notifier = Arc::new(CountingNotifier::default());
        let manager = FileIndexManager::with_config(
            vfs,
            Arc::new(StaticRootProvider::new("/proj")),
            notifier.clone(),
            IndexManagerConfig::default(),
        );

        let outcome = manager.sync();
        assert!(matches!(
            outcome,
            SyncOutcome::Rebuilt(SyncReport {
                truncated: true,
                files: DEFAULT_MAX_FILES,
                ..
            })
        ));
        assert_eq!(notifier.hits.load(Ordering::SeqCst), 1);

        // Dirty was cleared: a later query serves the partial lists without
        // re-walking or re-notifying.
        assert_eq!(manager.sync(), SyncOutcome::Clean);
        assert_eq!(
            manager.records(ALL_FILES_INDEX).unwrap().len(),
            DEFAULT_MAX_FILES
        );
        assert_eq!(notifier.hits.load(Ordering::SeqCst), 1);
        assert!(manager.status().truncated);
    }

    #[test]
    fn status_reports_per_index_counts() {
        let manager = manager_over(fake_project());
        manager.sync();
        let status = manager.status();
        let all = status
            .indexes
            .iter()
            .find(|counts| counts.name == ALL_FILES_INDEX)
            .unwrap();
        let css = status
            .indexes
            .iter()
            .find(|counts| counts.name == CSS_FILES_INDEX)
            .unwrap();
        assert_eq!(all.records, 5);
        assert_eq!(css.records, 3);
        assert_eq!(status.scanned_files, 5);
        assert_eq!(status.scanned_dirs, 3);
    }

    #[test]
    fn indexes_a_real_directory_tree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("styles")).unwrap();
        File::create(temp.path().join("main.js")).unwrap();
        File::create(temp.path().join("styles/theme.css")).unwrap();
        File::create(temp.path().join("styles/reset.CSS")).unwrap();

        let provider = Arc::new(StaticRootProvider::new(temp.path()));
        let manager = FileIndexManager::new(OsVfs, provider);

        let all = manager.records(ALL_FILES_INDEX).unwrap();
        assert_eq!(all.len(), 3);

        let css = manager.records(CSS_FILES_INDEX).unwrap();
        assert_eq!(css.len(), 1);
        assert_eq!(css[0].name(), "theme.css");
        assert_eq!(css[0].full_path(), temp.path().join("styles/theme.css"));
    }
}

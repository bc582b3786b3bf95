//! Named index registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{IndexError, Result};
use crate::filter::IndexFilter;
use crate::types::{DirEntry, FileRecord, IndexCounts};

/// Name of the built-in index holding every file.
pub const ALL_FILES_INDEX: &str = "all";

/// Name of the built-in index holding files with a literal `.css` suffix.
pub const CSS_FILES_INDEX: &str = "css";

/// One named view over the file tree.
#[derive(Debug)]
pub struct Index {
    name: String,
    filter: IndexFilter,
    records: Vec<Arc<FileRecord>>,
}

impl Index {
    fn new(name: impl Into<String>, filter: IndexFilter) -> Self {
        Self {
            name: name.into(),
            filter,
            records: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records in traversal discovery order.
    pub fn records(&self) -> &[Arc<FileRecord>] {
        &self.records
    }
}

/// Registry of named indexes, all populated together in one traversal pass.
///
/// Membership is fixed after startup beyond the initial registration calls;
/// there is no removal operation.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: HashMap<String, Index>,
}

impl IndexRegistry {
    /// Creates a registry holding the two built-in indexes.
    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert(Index::new(ALL_FILES_INDEX, IndexFilter::AcceptAll));
        registry.insert(Index::new(
            CSS_FILES_INDEX,
            IndexFilter::ExtensionEquals(".css".to_string()),
        ));
        registry
    }

    fn insert(&mut self, index: Index) {
        self.indexes.insert(index.name.clone(), index);
    }

    /// Registers a new named index with an empty record list.
    pub fn register(&mut self, name: &str, filter: IndexFilter) -> Result<()> {
        filter.validate()?;
        if self.indexes.contains_key(name) {
            return Err(IndexError::DuplicateIndex(name.to_string()));
        }
        self.insert(Index::new(name, filter));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Index> {
        self.indexes
            .get(name)
            .ok_or_else(|| IndexError::UnknownIndex(name.to_string()))
    }

    /// Empties every index's record list ahead of a rebuild.
    pub fn clear_records(&mut self) {
        for index in self.indexes.values_mut() {
            index.records.clear();
        }
    }

    /// Classifies one file entry against every registered filter, appending a
    /// single shared record to each accepting index.
    pub fn add_file(&mut self, entry: &DirEntry) {
        let record = Arc::new(FileRecord::from_entry(entry));
        for index in self.indexes.values_mut() {
            if index.filter.matches(entry) {
                index.records.push(record.clone());
            }
        }
    }

    /// Record counts per index, sorted by name for stable output.
    pub fn counts(&self) -> Vec<IndexCounts> {
        let mut counts: Vec<IndexCounts> = self
            .indexes
            .values()
            .map(|index| IndexCounts {
                name: index.name.clone(),
                records: index.records.len(),
            })
            .collect();
        counts.sort_by(|a, b| a.name.cmp(&b.name));
        counts
    }
}

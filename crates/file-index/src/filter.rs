//! Filter predicates for named indexes.

use std::fmt;
use std::sync::Arc;

use crate::error::{IndexError, Result};
use crate::types::DirEntry;

/// Decides whether a discovered file belongs to an index.
///
/// Filters see the raw directory entry, not the record built from it.
#[derive(Clone)]
pub enum IndexFilter {
    /// Accept every file.
    AcceptAll,
    /// Accept files whose name ends with the given suffix.
    ///
    /// The comparison is a literal byte match: `".css"` accepts `theme.css`
    /// but not `reset.CSS`.
    ExtensionEquals(String),
    /// Caller-supplied predicate.
    ///
    /// The predicate runs during rebuild with the registry locked; it must
    /// not call back into the manager.
    Custom(Arc<dyn Fn(&DirEntry) -> bool + Send + Sync>),
}

impl IndexFilter {
    /// Validates the filter at registration time.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::ExtensionEquals(suffix) if suffix.is_empty() => Err(IndexError::InvalidFilter(
                "extension suffix must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns true when the entry belongs to an index using this filter.
    pub fn matches(&self, entry: &DirEntry) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::ExtensionEquals(suffix) => entry.name.ends_with(suffix.as_str()),
            Self::Custom(predicate) => predicate(entry),
        }
    }
}

impl fmt::Debug for IndexFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptAll => f.write_str("AcceptAll"),
            Self::ExtensionEquals(suffix) => f.debug_tuple("ExtensionEquals").field(suffix).finish(),
            Self::Custom(_) => f.write_str("Custom(<predicate>)"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index already registered: {0}")]
    DuplicateIndex(String),

    #[error("unknown index: {0}")]
    UnknownIndex(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("traversal aborted: more than {limit} files")]
    TraversalLimitExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;

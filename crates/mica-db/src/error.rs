use std::fmt;

use mica_query::{FilterParseError, ProjectionParseError};
use mica_store::StoreError;

#[derive(Debug)]
pub enum DbError {
    Store(StoreError),
    /// Malformed filter, projection or sort document. Reported before any
    /// document is scanned.
    InvalidQuerySpec(String),
    DuplicateKey(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Store(e) => write!(f, "store error: {e}"),
            DbError::InvalidQuerySpec(msg) => write!(f, "invalid query spec: {msg}"),
            DbError::DuplicateKey(id) => write!(f, "duplicate key: {id}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<StoreError> for DbError {
    fn from(e: StoreError) -> Self {
        DbError::Store(e)
    }
}

impl From<FilterParseError> for DbError {
    fn from(e: FilterParseError) -> Self {
        DbError::InvalidQuerySpec(e.to_string())
    }
}

impl From<ProjectionParseError> for DbError {
    fn from(e: ProjectionParseError) -> Self {
        DbError::InvalidQuerySpec(e.to_string())
    }
}

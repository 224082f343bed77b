use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    CollectionNotFound(String),
    LockPoisoned(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CollectionNotFound(name) => write!(f, "collection not found: {name}"),
            StoreError::LockPoisoned(msg) => write!(f, "lock poisoned: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

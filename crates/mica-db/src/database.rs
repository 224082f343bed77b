use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use bson::Bson;
use bson::oid::ObjectId;
use mica_store::{Store, StoreError};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::DbError;

/// How `_id` values are generated for documents inserted without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// A fresh `ObjectId` per document.
    #[default]
    ObjectId,
    /// A database-wide counter starting at 1, stored as Int64.
    Sequence,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object_id" => Ok(IdStrategy::ObjectId),
            "sequence" => Ok(IdStrategy::Sequence),
            other => Err(format!("unknown id strategy '{other}'")),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdStrategy::ObjectId => f.write_str("object_id"),
            IdStrategy::Sequence => f.write_str("sequence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "test".to_string(),
            id_strategy: IdStrategy::default(),
        }
    }
}

pub struct Database<S: Store> {
    store: S,
    config: DatabaseConfig,
    sequence: AtomicI64,
}

impl<S: Store> Database<S> {
    pub fn open(store: S, config: DatabaseConfig) -> Self {
        tracing::debug!(name = %config.name, id_strategy = %config.id_strategy, "opening database");
        Self {
            store,
            config,
            sequence: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Handle to a named collection. Nothing is created until the first write.
    pub fn collection<'db>(&'db self, name: &str) -> Collection<'db, S> {
        Collection::new(self, name)
    }

    /// Create an empty collection. Existing collections are left untouched.
    pub fn create_collection(&self, name: &str) -> Result<(), DbError> {
        tracing::debug!(db = %self.config.name, collection = name, "create collection");
        self.store.create_collection(name)?;
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<String>, DbError> {
        Ok(self.store.list_collections()?)
    }

    /// Drop a collection. Returns `false` if it did not exist.
    pub fn drop_collection(&self, name: &str) -> Result<bool, DbError> {
        tracing::debug!(db = %self.config.name, collection = name, "drop collection");
        match self.store.drop_collection(name) {
            Ok(()) => Ok(true),
            Err(StoreError::CollectionNotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every collection.
    pub fn drop_database(&self) -> Result<(), DbError> {
        tracing::debug!(db = %self.config.name, "drop database");
        self.store.clear()?;
        Ok(())
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn next_id(&self) -> Bson {
        match self.config.id_strategy {
            IdStrategy::ObjectId => Bson::ObjectId(ObjectId::new()),
            IdStrategy::Sequence => Bson::Int64(self.sequence.fetch_add(1, Ordering::Relaxed) + 1),
        }
    }
}

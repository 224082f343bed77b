use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use arc_swap::ArcSwap;
use bson::Document;

use crate::error::StoreError;
use crate::store::{CollectionData, Records, Snapshot, Store, Writer};

type Collection = Arc<ArcSwap<CollectionData>>;

/// In-memory collection store.
///
/// Each collection is an `imbl::Vector` of documents plus an `imbl::HashSet`
/// of their unique keys, behind an `ArcSwap`: readers load the current
/// version without locking, writers build the next one (sharing structure
/// with the previous one) and publish it on commit.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("write lock: {e}")))
    }

    fn get_or_create(&self, name: &str) -> Result<Collection, StoreError> {
        if let Some(existing) = self.read_collections()?.get(name) {
            return Ok(Arc::clone(existing));
        }
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::LockPoisoned(format!("collections: {e}")))?;
        Ok(Arc::clone(collections.entry(name.to_string()).or_insert_with(|| {
            Arc::new(ArcSwap::from_pointee(CollectionData::default()))
        })))
    }

    fn read_collections(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>, StoreError> {
        self.collections
            .read()
            .map_err(|e| StoreError::LockPoisoned(format!("collections: {e}")))
    }
}

impl Store for MemoryStore {
    type Writer<'a> = MemoryWriter<'a>;

    fn snapshot(&self, collection: &str) -> Result<Snapshot, StoreError> {
        let collections = self.read_collections()?;
        Ok(match collections.get(collection) {
            Some(data) => Snapshot::new(data.load_full()),
            None => Snapshot::default(),
        })
    }

    fn begin_write(&self, collection: &str) -> Result<Self::Writer<'_>, StoreError> {
        let guard = self.lock_writes()?;
        let target = self.get_or_create(collection)?;
        let staged = (**target.load()).clone();
        Ok(MemoryWriter {
            target,
            staged,
            _write_guard: guard,
        })
    }

    fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.get_or_create(name).map(|_| ())
    }

    fn drop_collection(&self, name: &str) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::LockPoisoned(format!("collections: {e}")))?;
        match collections.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::CollectionNotFound(name.to_string())),
        }
    }

    fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.read_collections()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        self.collections
            .write()
            .map_err(|e| StoreError::LockPoisoned(format!("collections: {e}")))?
            .clear();
        Ok(())
    }
}

/// Pending append to one collection. Nothing is visible to readers until
/// [`commit`](Writer::commit).
pub struct MemoryWriter<'a> {
    target: Collection,
    staged: CollectionData,
    /// Write lock held for the lifetime of the writer.
    _write_guard: MutexGuard<'a, ()>,
}

impl Writer for MemoryWriter<'_> {
    fn records(&self) -> &Records {
        &self.staged.records
    }

    fn contains_key(&self, key: &str) -> bool {
        self.staged.keys.contains(key)
    }

    fn push(&mut self, key: String, doc: Document) {
        self.staged.keys.insert(key);
        self.staged.records.push_back(doc);
    }

    fn commit(self) -> Result<(), StoreError> {
        self.target.store(Arc::new(self.staged));
        Ok(())
    }

    fn rollback(self) {}
}

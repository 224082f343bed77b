use std::sync::Arc;

use bson::Document;

use crate::error::StoreError;

/// Documents of one collection, in insertion order.
pub type Records = imbl::Vector<Document>;

/// Unique keys of the documents in a collection.
pub type Keys = imbl::HashSet<String>;

/// Everything stored for one collection. Records and their key index are
/// published together, so readers never see one without the other.
#[derive(Debug, Clone, Default)]
pub struct CollectionData {
    pub records: Records,
    pub keys: Keys,
}

/// An immutable view of a collection taken at a point in time.
///
/// Cloning is cheap and later writes are never visible through it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(Arc<CollectionData>);

impl Snapshot {
    pub fn new(data: Arc<CollectionData>) -> Self {
        Snapshot(data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ {
        self.0.records.iter()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.records.is_empty()
    }
}

pub trait Store {
    type Writer<'a>: Writer
    where
        Self: 'a;

    /// Snapshot a collection. A collection that was never written reads as empty.
    fn snapshot(&self, collection: &str) -> Result<Snapshot, StoreError>;

    /// Start an exclusive append to a collection, creating it if missing.
    ///
    /// Writers are serialized; holding one while calling another write method
    /// on the same store from the same thread blocks forever.
    fn begin_write(&self, collection: &str) -> Result<Self::Writer<'_>, StoreError>;

    fn create_collection(&self, name: &str) -> Result<(), StoreError>;
    fn drop_collection(&self, name: &str) -> Result<(), StoreError>;
    /// Collection names, sorted.
    fn list_collections(&self) -> Result<Vec<String>, StoreError>;
    /// Drop every collection.
    fn clear(&self) -> Result<(), StoreError>;
}

pub trait Writer {
    /// Committed documents followed by everything pushed so far.
    fn records(&self) -> &Records;
    /// Whether `key` belongs to a committed or already pushed document.
    fn contains_key(&self, key: &str) -> bool;
    /// Append a document under its unique key. Callers check
    /// [`contains_key`](Writer::contains_key) first.
    fn push(&mut self, key: String, doc: Document);

    // Lifecycle
    fn commit(self) -> Result<(), StoreError>;
    fn rollback(self);
}

use std::collections::HashSet;

use bson::{Bson, Document};
use mica_query::{FindOptions, ID_FIELD, Path, parse_filter};
use mica_store::{Store, Writer};

use crate::cursor::Cursor;
use crate::database::Database;
use crate::document::resolve_all;
use crate::error::DbError;
use crate::expression::{identity_key, matches};
use crate::result::{InsertManyResult, InsertOneResult};

/// A named collection within a [`Database`].
pub struct Collection<'db, S: Store> {
    db: &'db Database<S>,
    name: String,
}

impl<'db, S: Store> Collection<'db, S> {
    pub(crate) fn new(db: &'db Database<S>, name: &str) -> Self {
        Self {
            db,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert_one(&self, doc: Document) -> Result<InsertOneResult, DbError> {
        let mut ids = self.insert(vec![doc])?;
        let inserted_id = ids.pop().unwrap_or(Bson::Null);
        Ok(InsertOneResult { inserted_id })
    }

    /// Insert a batch atomically: either every document is stored or none is.
    pub fn insert_many(&self, docs: Vec<Document>) -> Result<InsertManyResult, DbError> {
        let inserted_ids = self.insert(docs)?;
        Ok(InsertManyResult { inserted_ids })
    }

    fn insert(&self, docs: Vec<Document>) -> Result<Vec<Bson>, DbError> {
        let mut writer = self.db.store().begin_write(&self.name)?;
        let mut ids = Vec::with_capacity(docs.len());

        for doc in docs {
            let doc = self.with_id(doc);
            let id = doc.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
            let key = identity_key(&id);
            if writer.contains_key(&key) {
                writer.rollback();
                tracing::debug!(collection = %self.name, id = %id, "duplicate _id rejected");
                return Err(DbError::DuplicateKey(id.to_string()));
            }
            writer.push(key, doc);
            ids.push(id);
        }

        writer.commit()?;
        tracing::debug!(collection = %self.name, count = ids.len(), "inserted documents");
        Ok(ids)
    }

    /// Put a generated `_id` first when the document has none.
    fn with_id(&self, doc: Document) -> Document {
        if doc.contains_key(ID_FIELD) {
            return doc;
        }
        let mut out = Document::new();
        out.insert(ID_FIELD, self.db.next_id());
        for (key, value) in doc {
            out.insert(key, value);
        }
        out
    }

    /// Query the collection. The filter is validated here; the returned
    /// cursor sees the collection as it is at this moment.
    pub fn find(&self, filter: Document) -> Result<Cursor, DbError> {
        let expr = parse_filter(&filter)?;
        let snapshot = self.db.store().snapshot(&self.name)?;
        tracing::debug!(collection = %self.name, documents = snapshot.len(), "find");
        Ok(Cursor::new(snapshot, expr))
    }

    pub fn find_with_options(&self, filter: Document, options: FindOptions) -> Result<Cursor, DbError> {
        let mut cursor = self.find(filter)?.with_sort(options.sort)?;
        if let Some(projection) = options.projection {
            cursor = cursor.project(projection)?;
        }
        if let Some(skip) = options.skip {
            cursor = cursor.skip(skip);
        }
        if let Some(limit) = options.limit {
            cursor = cursor.limit(limit);
        }
        Ok(cursor)
    }

    /// First matching document in insertion order, if any.
    pub fn find_one(&self, filter: Document) -> Result<Option<Document>, DbError> {
        Ok(self.find(filter)?.limit(1).iter().next())
    }

    pub fn count_documents(&self, filter: Document) -> Result<u64, DbError> {
        let expr = parse_filter(&filter)?;
        let snapshot = self.db.store().snapshot(&self.name)?;
        Ok(snapshot.iter().filter(|doc| matches(doc, &expr)).count() as u64)
    }

    /// Distinct values found at `field` across matching documents.
    ///
    /// Array values contribute their elements. Values keep first-seen order.
    pub fn distinct(&self, field: &str, filter: Document) -> Result<Vec<Bson>, DbError> {
        let path = Path::parse(field).map_err(|e| DbError::InvalidQuerySpec(e.to_string()))?;
        let expr = parse_filter(&filter)?;
        let snapshot = self.db.store().snapshot(&self.name)?;

        let mut values: Vec<Bson> = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |value: &Bson| {
            if seen.insert(identity_key(value)) {
                values.push(value.clone());
            }
        };
        for doc in snapshot.iter().filter(|doc| matches(doc, &expr)) {
            for candidate in resolve_all(doc, &path) {
                match candidate.value() {
                    Some(Bson::Array(items)) => items.iter().for_each(&mut push),
                    Some(value) => push(value),
                    None => {}
                }
            }
        }
        Ok(values)
    }

    /// Drop this collection. Returns `false` if it did not exist.
    pub fn drop(&self) -> Result<bool, DbError> {
        self.db.drop_collection(&self.name)
    }
}

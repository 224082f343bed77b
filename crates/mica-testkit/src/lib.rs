//! Arrange/act/assert harness for query scenarios.
//!
//! Every scenario gets its own in-memory [`Database`]; nothing is shared
//! between tests, so they can run in parallel.
//!
//! ```ignore
//! TestDbRunner::new()
//!     .init(vec![doc! { "age": 21 }, doc! { "age": 26 }])
//!     .act(|users| Ok(users.find(doc! { "age": 26 })?.to_array()))
//!     .expect_without_ids(vec![doc! { "age": 26 }]);
//! ```

use bson::Document;
use mica_db::{Collection, Database, DatabaseConfig, DbError};
use mica_store::MemoryStore;

/// Collection every scenario inserts into.
pub const ENTITIES: &str = "entities";

pub struct TestDbRunner {
    config: DatabaseConfig,
}

impl Default for TestDbRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDbRunner {
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        // Another test in the same binary may have installed it already.
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Self { config }
    }

    /// Documents inserted into a fresh collection before the action runs.
    pub fn init(&self, entities: Vec<Document>) -> Arrange {
        Arrange {
            config: self.config.clone(),
            entities,
        }
    }
}

pub struct Arrange {
    config: DatabaseConfig,
    entities: Vec<Document>,
}

impl Arrange {
    pub fn act<F>(self, action: F) -> Act<F>
    where
        F: FnOnce(&Collection<'_, MemoryStore>) -> Result<Vec<Document>, DbError>,
    {
        Act {
            arrange: self,
            action,
        }
    }
}

pub struct Act<F> {
    arrange: Arrange,
    action: F,
}

impl<F> Act<F>
where
    F: FnOnce(&Collection<'_, MemoryStore>) -> Result<Vec<Document>, DbError>,
{
    /// Seed a fresh database, run the action and return its output.
    pub fn run(self) -> Result<Vec<Document>, DbError> {
        let db = Database::open(MemoryStore::new(), self.arrange.config);
        let collection = db.collection(ENTITIES);
        if !self.arrange.entities.is_empty() {
            collection.insert_many(self.arrange.entities)?;
        }
        (self.action)(&collection)
    }

    /// Assert the action returns exactly `expected`, in order.
    #[track_caller]
    pub fn expect(self, expected: Vec<Document>) {
        match self.run() {
            Ok(actual) => assert_eq!(actual, expected),
            Err(e) => panic!("scenario failed: {e}"),
        }
    }

    /// Like [`expect`](Act::expect), for documents that received generated
    /// ids: every result must carry an `_id`, which is then ignored.
    #[track_caller]
    pub fn expect_without_ids(self, expected: Vec<Document>) {
        let actual = match self.run() {
            Ok(actual) => actual,
            Err(e) => panic!("scenario failed: {e}"),
        };
        let stripped: Vec<Document> = actual
            .into_iter()
            .map(|mut doc| {
                assert!(doc.remove("_id").is_some(), "result without _id: {doc:?}");
                doc
            })
            .collect();
        assert_eq!(stripped, expected);
    }

    /// Assert the action is rejected as an invalid query.
    #[track_caller]
    pub fn expect_invalid(self) {
        match self.run() {
            Err(DbError::InvalidQuerySpec(_)) => {}
            other => panic!("expected an invalid query error, got {other:?}"),
        }
    }
}

#![allow(dead_code)]

use bson::{Document, doc};
use mica_db::{Database, DatabaseConfig};
use mica_store::MemoryStore;

pub const COLLECTION: &str = "users";

pub fn temp_db() -> Database<MemoryStore> {
    Database::open(MemoryStore::new(), DatabaseConfig::default())
}

pub fn users() -> Vec<Document> {
    vec![
        doc! { "_id": 1, "name": "Nikiata", "age": 21, "skill": "JavaScript", "city": "Moscow" },
        doc! { "_id": 2, "name": "Vasa", "age": 25, "skill": "Java", "city": "Omsk" },
        doc! { "_id": 3, "name": "Ura", "age": 23, "skill": "C#", "city": "Moscow" },
        doc! { "_id": 4, "name": "Pavel", "age": 26, "skill": "JavaScript", "city": "Kazan" },
        doc! { "_id": 5, "name": "Anna", "age": 21, "skill": "Ruby" },
    ]
}

/// Database holding the five seed users.
pub fn seeded_db() -> Database<MemoryStore> {
    let db = temp_db();
    db.collection(COLLECTION).insert_many(users()).unwrap();
    db
}

pub fn ids(docs: &[Document]) -> Vec<i32> {
    docs.iter().map(|d| d.get_i32("_id").unwrap()).collect()
}

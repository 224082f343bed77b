mod common;
use common::*;

use bson::doc;
use mica_db::{Database, DatabaseConfig, IdStrategy};
use mica_store::MemoryStore;

#[test]
fn default_config() {
    let db = temp_db();
    assert_eq!(db.name(), "test");
    assert_eq!(db.config().id_strategy, IdStrategy::ObjectId);
}

#[test]
fn config_deserializes_with_default_strategy() {
    let config: DatabaseConfig = bson::deserialize_from_document(doc! { "name": "hr" }).unwrap();
    assert_eq!(config.name, "hr");
    assert_eq!(config.id_strategy, IdStrategy::ObjectId);

    let config: DatabaseConfig =
        bson::deserialize_from_document(doc! { "name": "hr", "id_strategy": "sequence" }).unwrap();
    assert_eq!(config.id_strategy, IdStrategy::Sequence);
}

#[test]
fn collections_are_created_on_first_write() {
    let db = temp_db();
    assert!(db.list_collections().unwrap().is_empty());
    db.collection("users").insert_one(doc! { "a": 1 }).unwrap();
    db.create_collection("inventory").unwrap();
    assert_eq!(db.list_collections().unwrap(), vec!["inventory", "users"]);
}

#[test]
fn drop_collection_reports_existence() {
    let db = seeded_db();
    assert!(db.drop_collection(COLLECTION).unwrap());
    assert!(!db.drop_collection(COLLECTION).unwrap());
    assert!(!db.collection(COLLECTION).drop().unwrap());
    assert_eq!(db.collection(COLLECTION).count_documents(doc! {}).unwrap(), 0);
}

#[test]
fn drop_database_clears_everything() {
    let db = seeded_db();
    db.collection("inventory").insert_one(doc! { "item": null }).unwrap();
    db.drop_database().unwrap();
    assert!(db.list_collections().unwrap().is_empty());
    assert!(db.collection(COLLECTION).find(doc! {}).unwrap().to_array().is_empty());
}

#[test]
fn databases_are_isolated() {
    let a = seeded_db();
    let b = Database::open(MemoryStore::new(), DatabaseConfig::default());
    assert_eq!(a.collection(COLLECTION).count_documents(doc! {}).unwrap(), 5);
    assert_eq!(b.collection(COLLECTION).count_documents(doc! {}).unwrap(), 0);
}

#[test]
fn database_is_shareable_across_threads() {
    let db = std::sync::Arc::new(temp_db());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = std::sync::Arc::clone(&db);
            std::thread::spawn(move || {
                for i in 0..10 {
                    db.collection(COLLECTION)
                        .insert_one(doc! { "thread": t, "i": i })
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(db.collection(COLLECTION).count_documents(doc! {}).unwrap(), 40);
}

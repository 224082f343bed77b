use std::io::{BufRead, BufReader, Write};
use std::process;

use bson::Document;
use mica_db::{Database, DatabaseConfig, IdStrategy};
use mica_query::FindOptions;
use mica_store::MemoryStore;

const USAGE: &str = "usage: mica <documents.jsonl> <filter-json> [projection-json]";
const COLLECTION: &str = "documents";

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (path, filter, projection) = match args.as_slice() {
        [path, filter] => (path, filter, None),
        [path, filter, projection] => (path, filter, Some(projection)),
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let config = config_from_env();
    let filter = parse_json(filter, "filter");
    let options = FindOptions {
        projection: projection.map(|p| parse_json(p, "projection")),
        ..FindOptions::default()
    };

    let db = Database::open(MemoryStore::new(), config);
    let collection = db.collection(COLLECTION);
    let docs = read_documents(path);
    let loaded = docs.len();
    if !docs.is_empty() {
        collection.insert_many(docs).unwrap_or_else(|e| {
            eprintln!("failed to load {path}: {e}");
            process::exit(1);
        });
    }
    tracing::info!("loaded {loaded} documents from {path} into {}", db.name());

    let cursor = collection
        .find_with_options(filter, options)
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for doc in cursor.iter() {
        let line = serde_json::to_string(&doc).unwrap_or_else(|e| {
            eprintln!("failed to encode result: {e}");
            process::exit(1);
        });
        if writeln!(out, "{line}").is_err() {
            // stdout closed (e.g. piped into `head`)
            return;
        }
    }
}

/// `MICA_DB_NAME` and `MICA_ID_STRATEGY` (`object_id` | `sequence`).
fn config_from_env() -> DatabaseConfig {
    let defaults = DatabaseConfig::default();
    let name = std::env::var("MICA_DB_NAME").unwrap_or(defaults.name);
    let id_strategy = match std::env::var("MICA_ID_STRATEGY") {
        Ok(s) => s.parse::<IdStrategy>().unwrap_or_else(|e| {
            eprintln!("MICA_ID_STRATEGY: {e}");
            process::exit(2);
        }),
        Err(_) => defaults.id_strategy,
    };
    DatabaseConfig { name, id_strategy }
}

fn parse_json(text: &str, what: &str) -> Document {
    serde_json::from_str::<Document>(text).unwrap_or_else(|e| {
        eprintln!("invalid {what} JSON: {e}");
        process::exit(2);
    })
}

/// One JSON object per non-blank line.
fn read_documents(path: &str) -> Vec<Document> {
    let file = std::fs::File::open(path).unwrap_or_else(|e| {
        eprintln!("failed to open {path}: {e}");
        process::exit(1);
    });
    let mut docs = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.unwrap_or_else(|e| {
            eprintln!("failed to read {path}: {e}");
            process::exit(1);
        });
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(&line) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                eprintln!("{path}:{}: {e}", i + 1);
                process::exit(1);
            }
        }
    }
    docs
}

use bson::{Document, doc};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use mica_db::{Database, DatabaseConfig};
use mica_store::MemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ─────────────────────────────────────────────────

const SKILLS: &[&str] = &["Java", "JavaScript", "C#", "Ruby", "Go"];
const CITIES: &[&str] = &["Moscow", "Omsk", "Kazan"];

fn generate_docs(n: usize) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|i| {
            doc! {
                "_id": i as i64,
                "name": format!("User {i}"),
                "age": rng.gen_range(18..65_i32),
                "city": CITIES[rng.gen_range(0..CITIES.len())],
                "skills": [
                    { "name": SKILLS[rng.gen_range(0..SKILLS.len())], "experienceYear": rng.gen_range(0..10_i32) },
                    { "name": SKILLS[rng.gen_range(0..SKILLS.len())], "experienceYear": rng.gen_range(0..10_i32) },
                ],
            }
        })
        .collect()
}

fn seeded_db(n: usize) -> Database<MemoryStore> {
    let db = Database::open(MemoryStore::new(), DatabaseConfig::default());
    db.collection("bench").insert_many(generate_docs(n)).unwrap();
    db
}

// ── Insert ──────────────────────────────────────────────────

fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_insert");
    for n in [1_000, 10_000] {
        let docs = generate_docs(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || (Database::open(MemoryStore::new(), DatabaseConfig::default()), docs.clone()),
                |(db, docs)| db.collection("bench").insert_many(docs).unwrap(),
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

// ── Query ───────────────────────────────────────────────────

fn bench_query(c: &mut Criterion) {
    let filters = [
        ("scan", doc! {}),
        ("eq", doc! { "city": "Moscow" }),
        ("range", doc! { "age": { "$gte": 30, "$lt": 40 } }),
        ("dotted", doc! { "skills.name": "Go" }),
        (
            "elem_match",
            doc! { "skills": { "$elemMatch": { "name": "Java", "experienceYear": { "$gt": 5 } } } },
        ),
    ];
    for n in [1_000, 10_000] {
        let db = seeded_db(n);
        let mut group = c.benchmark_group(format!("query_{n}"));
        for (name, filter) in &filters {
            group.bench_function(*name, |b| {
                b.iter(|| db.collection("bench").find(filter.clone()).unwrap().iter().count())
            });
        }
        group.finish();
    }
}

fn bench_project_sort(c: &mut Criterion) {
    let db = seeded_db(10_000);
    let mut group = c.benchmark_group("shape_10000");
    group.bench_function("project_inclusive", |b| {
        b.iter(|| {
            db.collection("bench")
                .find(doc! {})
                .unwrap()
                .project(doc! { "_id": 0, "name": 1, "skills.name": 1 })
                .unwrap()
                .iter()
                .count()
        })
    });
    group.bench_function("sort_age_limit", |b| {
        b.iter(|| {
            db.collection("bench")
                .find(doc! {})
                .unwrap()
                .sort(doc! { "age": -1 })
                .unwrap()
                .limit(10)
                .to_array()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_bulk_insert, bench_query, bench_project_sort);
criterion_main!(benches);

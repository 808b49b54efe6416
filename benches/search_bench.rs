use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lucerne::storage::memory::MemoryStorageConfig;
use lucerne::storage::{StorageConfig, StorageFactory};
use lucerne::{Document, Engine, IndexConfig};

const WORDS: &[&str] = &[
    "rust", "search", "engine", "index", "segment", "posting", "query", "score", "term", "field",
    "token", "merge", "commit", "reader", "writer", "store", "phrase", "boolean", "lucerne", "hotel",
];

fn generate_documents(count: usize) -> Vec<Document> {
    let mut seed = 0x2545_f491_u64;
    (0..count)
        .map(|i| {
            let words: Vec<&str> = (0..12)
                .map(|_| {
                    seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                    WORDS[(seed >> 33) as usize % WORDS.len()]
                })
                .collect();
            Document::with_id(format!("doc_{i}")).add_text("content", words.join(" "), true)
        })
        .collect()
}

fn engine() -> Engine {
    let storage =
        StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default())).unwrap();
    Engine::new(storage, IndexConfig::default()).unwrap()
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Indexing");
    group.sample_size(10);

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let docs = generate_documents(count);
            b.iter(|| {
                let engine = engine();
                let mut writer = engine.writer().unwrap();
                writer.add_documents(docs.clone()).unwrap();
                writer.commit().unwrap();
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search");

    let engine = engine();
    let mut writer = engine.writer().unwrap();
    writer.add_documents(generate_documents(10_000)).unwrap();
    writer.commit().unwrap();
    let searcher = engine.searcher().unwrap();
    let parser = engine.query_parser();

    for query in ["rust", "rust search", "rust OR hotel", "\"search engine\"", "index -merge"] {
        let parsed = parser.parse(query).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(query), &parsed, |b, parsed| {
            b.iter(|| black_box(searcher.search(parsed, 10).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indexing, bench_search);
criterion_main!(benches);

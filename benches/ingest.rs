//! Benchmarks for chunkpack ingestion.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench ingest -- classify`

use std::fs;
use std::io::Cursor;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tempfile::TempDir;

use chunkpack::ChunkedJsonlParser;
use chunkpack::classify::classify;
use chunkpack::config::IngestConfig;
use chunkpack::record::RawRecord;
use chunkpack::streaming::RecordStream;

// =============================================================================
// Test Data Generators
// =============================================================================

const TEXTS: &[&str] = &[
    "Message number",
    "Bob 拍了拍 Alice",
    "[聊天记录]",
    "通话时长 00:42",
    "QQ红包",
];

fn generate_chunk(count: usize, offset: usize) -> String {
    let mut lines = Vec::with_capacity(count);
    for i in offset..offset + count {
        let uin = 10_000 + (i % 50);
        let timestamp = 1705314600000i64 + (i as i64 * 60_000);
        let text = TEXTS[i % TEXTS.len()];
        lines.push(format!(
            r#"{{"id": "{i}", "timestamp": {timestamp}, "sender": {{"uid": "u_{uin}", "uin": "{uin}", "nickname": "user{uin}", "groupCard": "card{uin}"}}, "type": "text", "content": {{"text": "{text} {i}", "elements": [], "resources": []}}, "recalled": false}}"#
        ));
    }
    lines.join("\n")
}

fn generate_bundle(count: usize, per_chunk: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("chunks")).unwrap();

    let mut entries = Vec::new();
    let mut offset = 0;
    while offset < count {
        let n = per_chunk.min(count - offset);
        let name = format!("chunk_{:04}.jsonl", entries.len() + 1);
        fs::write(dir.path().join("chunks").join(&name), generate_chunk(n, offset)).unwrap();
        entries.push(format!(
            r#"{{"fileName": "{name}", "relativePath": "chunks/{name}", "count": {n}}}"#
        ));
        offset += n;
    }

    let manifest = format!(
        r#"{{"metadata": {{"version": "5.5.0", "format": "chunked-jsonl"}},
            "chatInfo": {{"name": "Bench", "type": "group"}},
            "statistics": {{"totalMessages": {count}}},
            "chunked": {{"chunksDir": "chunks", "chunks": [{}]}}}}"#,
        entries.join(",")
    );
    fs::write(dir.path().join("manifest.json"), manifest).unwrap();
    dir
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_record_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_stream");

    for size in [1_000, 10_000, 100_000] {
        let chunk = generate_chunk(size, 0);
        group.throughput(Throughput::Bytes(chunk.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunk, |b, chunk| {
            b.iter(|| {
                let stream = RecordStream::new(Cursor::new(black_box(chunk.as_bytes())));
                black_box(stream.count())
            });
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let records: Vec<RawRecord> = generate_chunk(1_000, 0)
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("mixed_1000", |b| {
        b.iter(|| {
            for record in &records {
                black_box(classify(black_box(record)));
            }
        });
    });
    group.finish();
}

fn bench_full_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_ingest");
    group.sample_size(20);

    for (size, per_chunk) in [(10_000, 2_500), (100_000, 25_000)] {
        let bundle = generate_bundle(size, per_chunk);
        let manifest = bundle.path().join("manifest.json");
        let parser = ChunkedJsonlParser::with_config(IngestConfig::new().with_progress_interval(0));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &manifest, |b, manifest| {
            b.iter(|| ingest(&parser, manifest));
        });
    }
    group.finish();
}

fn ingest(parser: &ChunkedJsonlParser, manifest: &Path) -> usize {
    parser
        .parse(manifest)
        .map(|output| output.messages.len())
        .unwrap_or(0)
}

criterion_group!(benches, bench_record_stream, bench_classify, bench_full_ingest);
criterion_main!(benches);

//! Benchmarks for unscan structuring and encoding.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic OCR-like text; no OCR engine is needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unscan::model::page_marker;
use unscan::render::{csv_rows, to_json, to_text, JsonFormat};
use unscan::structure::structure;

/// Creates document text shaped like joined OCR output.
fn create_document_text(page_count: u32) -> String {
    (1..=page_count)
        .map(|page| {
            let body: Vec<String> = (0..20)
                .map(|line| {
                    format!(
                        "Line {} of page {} reads like a sentence. Another follows here!",
                        line, page
                    )
                })
                .collect();
            format!("{}\n{}", page_marker(page), body.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Benchmark paragraph/sentence/word decomposition.
fn bench_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");

    for page_count in [1, 10, 50].iter() {
        let text = create_document_text(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| structure(black_box(&text)));
        });
    }

    group.finish();
}

/// Benchmark in-memory encoding of each format.
fn bench_encoding(c: &mut Criterion) {
    let text = create_document_text(10);
    let data = structure(&text);

    c.bench_function("encode_json", |b| {
        b.iter(|| to_json(black_box(&text), black_box(&data), JsonFormat::Pretty).unwrap());
    });

    c.bench_function("encode_csv_rows", |b| {
        b.iter(|| csv_rows(black_box(&text)));
    });

    c.bench_function("encode_txt", |b| {
        b.iter(|| to_text(black_box(&text)));
    });
}

criterion_group!(benches, bench_structure, bench_encoding);
criterion_main!(benches);

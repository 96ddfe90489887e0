//! Benchmarks for candidate extraction and the cleaning pipeline
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mailsift::models::{FilterConfiguration, OutputFormat};
use mailsift::services::{CleaningService, Tokenizer};
use std::hint::black_box;

fn generate_text(count: usize) -> String {
    (0..count)
        .map(|i| match i % 5 {
            0 => format!("Contact: User{}@Example.com, ", i % 97),
            1 => format!("{}sales@shop{}.net; ", i % 10, i),
            2 => format!("x@short{}.io\r\n", i),
            3 => format!("promo{}@spam.biz ", i),
            _ => format!("plain words line {} with no address\n", i),
        })
        .collect()
}

fn all_rules() -> FilterConfiguration {
    FilterConfiguration {
        remove_duplicates: true,
        remove_invalid: true,
        remove_single_char_local: true,
        remove_numeric_start_local: true,
        keywords: vec!["spam".to_string(), "promo".to_string()],
        output_format: OutputFormat::SameAsInput,
    }
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    let tokenizer = Tokenizer::new();

    for size in [100, 1_000, 10_000].iter() {
        let text = generate_text(*size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| tokenizer.extract(black_box(text)));
        });
    }

    group.finish();
}

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean");
    let tokenizer = Tokenizer::new();
    let service = CleaningService::new();
    let config = all_rules();

    for size in [100, 1_000, 10_000].iter() {
        let candidates = tokenizer.extract(&generate_text(*size));
        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &candidates,
            |b, candidates| {
                b.iter(|| service.clean(black_box(candidates), &config));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_clean);
criterion_main!(benches);

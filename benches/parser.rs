//! Parser throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dango_terminal::Parser;

fn bench_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let input = "The quick brown fox jumps over the lazy dog. ".repeat(500);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("plain_text", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            let mut count = 0usize;
            parser.parse(black_box(input.as_bytes()), |_| count += 1);
            black_box(count)
        })
    });

    group.finish();
}

fn bench_csi_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let input = "\x1b[1;31mred\x1b[0m \x1b[10;20H\x1b[2J\x1b[38;2;1;2;3mx".repeat(200);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("csi_sequences", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            let mut count = 0usize;
            parser.parse(black_box(input.as_bytes()), |_| count += 1);
            black_box(count)
        })
    });

    group.finish();
}

fn bench_utf8_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    let input = "日本語のテキストと emoji 🎉 が混ざった行です。".repeat(200);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("utf8_text", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            let mut count = 0usize;
            parser.parse(black_box(input.as_bytes()), |_| count += 1);
            black_box(count)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_plain_text, bench_csi_heavy, bench_utf8_text);
criterion_main!(benches);

//! Criterion benchmarks for the connectome engine.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use connectome::decode::decode_word;
use connectome::engine::Engine;
use connectome::observer::EngineAdapter;
use connectome::table::ConnectionTable;
use connectome::wiring::TableBuilder;

fn make_table(cells: u16, fanout: usize, seed: u64) -> ConnectionTable {
    let signaling = cells - cells / 4;
    TableBuilder::random(signaling, cells, fanout, seed)
        .build()
        .unwrap()
}

/// Benchmark tick() with varying network sizes.
fn bench_tick_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_size");

    for cells in [64u16, 128, 256, 397, 512].iter() {
        let table = make_table(*cells, 12, 42);
        group.throughput(Throughput::Elements(table.connection_count() as u64));

        group.bench_with_input(BenchmarkId::new("tick", cells), &table, |b, table| {
            let mut engine = Engine::new(table);
            let stimulus: [u16; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

            b.iter(|| {
                engine.tick(black_box(&stimulus)).unwrap();
                black_box(engine.diagnostics().discharged_last_tick)
            });
        });
    }

    group.finish();
}

/// Benchmark a quiet network (no stimulus) against a driven one.
fn bench_tick_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_load");
    let table = make_table(397, 16, 7);

    group.bench_function("idle", |b| {
        let mut engine = Engine::new(&table);
        let none: &[u16] = &[];
        b.iter(|| engine.tick(black_box(none)).unwrap());
    });

    group.bench_function("driven", |b| {
        let mut engine = Engine::new(&table);
        let stimulus: Vec<u16> = (0..32).collect();
        b.iter(|| engine.tick(black_box(&stimulus)).unwrap());
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let table = make_table(397, 16, 3);
    group.throughput(Throughput::Elements(table.words().len() as u64));

    group.bench_function("all_words", |b| {
        b.iter(|| {
            let mut acc = 0i32;
            for &w in table.words() {
                let c = decode_word(w);
                acc = acc.wrapping_add(c.target as i32 + c.weight as i32);
            }
            black_box(acc)
        });
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let table = make_table(397, 12, 11);
    let mut engine = Engine::new(&table);
    for _ in 0..100 {
        engine.tick(&[0, 1, 2]).unwrap();
    }

    c.bench_function("snapshot_397", |b| {
        b.iter(|| black_box(EngineAdapter::new(&engine).snapshot()));
    });
}

criterion_group!(
    benches,
    bench_tick_sizes,
    bench_tick_load,
    bench_decode,
    bench_snapshot,
);

criterion_main!(benches);

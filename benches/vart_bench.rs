use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

use vart::keys::bytes_key::BytesKey;
use vart::keys::fixed_key::FixedKey;
use vart::VartTree;

fn seq_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("seq_insert");
    group.throughput(Throughput::Elements(1));
    group.bench_function("seq_insert", |b| {
        let mut tree: VartTree<FixedKey, u64> = VartTree::new();
        let mut key = 0u64;
        b.iter(|| {
            tree.insert(key, key);
            key += 1;
        })
    });
    group.finish();
}

fn rand_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rand_insert");
    group.throughput(Throughput::Elements(1));
    let mut rng = rand::rng();
    let keys: Vec<u64> = (0..(1 << 20)).map(|_| rng.random()).collect();
    group.bench_function("rand_insert", |b| {
        let mut tree: VartTree<FixedKey, u64> = VartTree::new();
        let mut i = 0usize;
        b.iter(|| {
            let k = keys[i % keys.len()];
            tree.insert(k, k);
            i += 1;
        })
    });
    group.finish();
}

fn rand_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("rand_get");
    for size in [1u64 << 14, 1 << 18, 1 << 20] {
        let mut tree: VartTree<FixedKey, u64> = VartTree::new();
        for i in 0..size {
            tree.insert(i, i);
        }
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            let mut rng = rand::rng();
            b.iter(|| {
                let k = rng.random_range(0..*size);
                tree.get(k)
            })
        });
    }
    group.finish();
}

fn string_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_get");
    let words: Vec<String> = (0..65_536u32).map(|i| format!("word-{i:08}")).collect();
    let mut tree: VartTree<BytesKey, u32> = VartTree::new();
    for (i, w) in words.iter().enumerate() {
        tree.insert(w.as_str(), i as u32);
    }
    group.throughput(Throughput::Elements(1));
    group.bench_function("string_get", |b| {
        let mut rng = rand::rng();
        b.iter(|| {
            let w = &words[rng.random_range(0..words.len())];
            tree.get(w.as_str())
        })
    });
    group.finish();
}

fn iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");
    for size in [1u64 << 14, 1 << 18] {
        let mut tree: VartTree<FixedKey, u64> = VartTree::new();
        for i in 0..size {
            tree.insert(i, i);
        }
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| tree.iter().count())
        });
    }
    group.finish();
}

criterion_group!(benches, seq_insert, rand_insert, rand_get, string_get, iteration);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Transform plugin microbenchmarks.
//!
//! Forward and inverse throughput of every built-in plugin over text
//! payloads of increasing size, plus the entropy analyzer.

use cipherbench_core::payload::generate_text_payload;
use cipherbench_core::{shannon_entropy, AlgorithmId, KeyStore, PluginRegistry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

/// Payload sizes to benchmark (in bytes).
const PAYLOAD_SIZES: &[u64] = &[1024, 100 * 1024, 1024 * 1024];

/// Benchmark the forward transform of every plugin.
fn bench_transform(c: &mut Criterion) {
    let keys = KeyStore::generate();
    let registry = PluginRegistry::with_builtin();

    for algorithm in AlgorithmId::ALL {
        let plugin = registry
            .resolve(algorithm, &keys)
            .expect("Failed to resolve plugin");
        let mut group = c.benchmark_group(format!("transform/{}", algorithm));
        group.measurement_time(Duration::from_secs(5));

        for &size in PAYLOAD_SIZES {
            let payload = generate_text_payload(size);
            group.throughput(Throughput::Bytes(payload.len() as u64));

            group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
                b.iter(|| black_box(plugin.transform(black_box(payload)).expect("Transform failed")));
            });
        }

        group.finish();
    }
}

/// Benchmark the inverse transform of every plugin.
fn bench_inverse(c: &mut Criterion) {
    let keys = KeyStore::generate();
    let registry = PluginRegistry::with_builtin();

    for algorithm in AlgorithmId::ALL {
        let plugin = registry
            .resolve(algorithm, &keys)
            .expect("Failed to resolve plugin");
        let mut group = c.benchmark_group(format!("inverse/{}", algorithm));
        group.measurement_time(Duration::from_secs(5));

        for &size in PAYLOAD_SIZES {
            let artifact = plugin
                .transform(&generate_text_payload(size))
                .expect("Transform failed")
                .output;
            group.throughput(Throughput::Bytes(artifact.len() as u64));

            group.bench_with_input(BenchmarkId::from_parameter(size), &artifact, |b, artifact| {
                b.iter(|| black_box(plugin.inverse(black_box(artifact)).expect("Inverse failed")));
            });
        }

        group.finish();
    }
}

/// Benchmark the entropy analyzer on ciphertext-like input.
fn bench_entropy(c: &mut Criterion) {
    let mut group = c.benchmark_group("entropy");

    for &size in PAYLOAD_SIZES {
        let data: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
        group.throughput(Throughput::Bytes(size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(shannon_entropy(black_box(data))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform, bench_inverse, bench_entropy);
criterion_main!(benches);

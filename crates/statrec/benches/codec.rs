// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record Codec Benchmark
//!
//! Measures encode/decode cost for a typical status record (a few scalars
//! and per-node arrays) and for a large array-heavy record.

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use statrec::{codec, Record, ScalarType, SnapshotStore};

fn status_record(nodes: usize) -> Record {
    let mut r = Record::new("storage_status", "store01", 3);
    r.add("runno", 12345i32, 0).unwrap();
    r.add("expno", 7i32, 0).unwrap();
    r.add("state", 0i8, 16).unwrap();
    r.add("nevent_in", 0u64, nodes).unwrap();
    r.add("nqueue", 0u32, nodes).unwrap();
    r.add("evtrate", 0f32, nodes).unwrap();
    r.add("flowrate", 0f64, nodes).unwrap();
    r.set_text("state", "RUNNING").unwrap();
    for i in 0..nodes {
        r.set("nevent_in", i, i as u64 * 1000).unwrap();
        r.set("evtrate", i, 1.25f32).unwrap();
    }
    r
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for nodes in [8usize, 256, 4096] {
        let record = status_record(nodes);
        group.throughput(Throughput::Bytes(codec::encoded_len(&record) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &record, |b, r| {
            let mut out = Vec::with_capacity(codec::encoded_len(r));
            b.iter(|| {
                out.clear();
                codec::encode_into(black_box(r), &mut out).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for nodes in [8usize, 256, 4096] {
        let bytes = codec::encode(&status_record(nodes)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &bytes, |b, bytes| {
            b.iter(|| codec::decode(black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let store = SnapshotStore::new();
    let bytes = codec::encode(&status_record(64)).unwrap();
    let handle = store.handle("storage_status", "store01");
    c.bench_function("snapshot_ingest_64", |b| {
        b.iter(|| {
            store.ingest(black_box(&bytes)).unwrap();
            black_box(handle.load());
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_ingest);
criterion_main!(benches);

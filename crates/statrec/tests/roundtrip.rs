// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// End-to-end exchange: producer builds and encodes, consumer decodes,
// negotiates and reads typed values. Includes a randomized round trip over
// generated records and a stream written to a temporary file.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_possible_truncation)]

use statrec::stream::StreamStats;
use statrec::{
    codec, FieldValues, FormatExpectation, Record, RecordStreamReader, RecordStreamWriter,
    ScalarType, ScalarValue, SnapshotStore, StoreError, Verdict,
};

fn storage_status() -> Record {
    let mut r = Record::new("storage_status", "store01", 3);
    r.declare("runno", ScalarType::Int32, 0).unwrap();
    r.declare("rate", ScalarType::Float32, 4).unwrap();
    r.declare("nqueue", ScalarType::UInt32, 2).unwrap();
    r.declare("disk", ScalarType::Float64, 0).unwrap();
    r.declare("state", ScalarType::Int8, 8).unwrap();
    r.set("runno", 0, 12345).unwrap();
    r.set("rate", 2, 1.5f32).unwrap();
    r.set_all("nqueue", &[10u32, 4_000_000_000]).unwrap();
    r.set("disk", 0, 0.875f64).unwrap();
    r.set_text("state", "RUNNING").unwrap();
    r
}

#[test]
fn producer_to_consumer() {
    let bytes = codec::encode(&storage_status()).unwrap();
    let received = codec::decode(&bytes).unwrap();

    let expect = FormatExpectation::new("storage_status")
        .revision(3)
        .field("runno", ScalarType::Int32)
        .field("rate", ScalarType::Float32);
    assert_eq!(expect.evaluate(&received), Verdict::Compatible);

    assert_eq!(received.get::<i64>("runno", 0).unwrap(), 12345);
    assert_eq!(received.get::<f64>("rate", 2).unwrap(), 1.5);
    assert_eq!(received.get::<u64>("nqueue", 1).unwrap(), 4_000_000_000);
    assert!(received.get::<i32>("nqueue", 1).is_err());
    assert_eq!(received.text("state").unwrap(), "RUNNING");
    assert_eq!(received.byte_size(), 4 + 16 + 8 + 8 + 8);
    let names: Vec<&str> = received.field_names().collect();
    assert_eq!(names, ["runno", "rate", "nqueue", "disk", "state"]);
}

#[test]
fn status_v1_scenario() {
    let mut r = Record::new("status_v1", "node0", 3);
    r.declare("runno", ScalarType::Int32, 0).unwrap();
    r.declare("rate", ScalarType::Float32, 4).unwrap();
    r.set("runno", 0, 12345).unwrap();
    r.set_all("rate", &[1.0f32, 2.5, 0.0, 100.25]).unwrap();

    let decoded = codec::decode(&codec::encode(&r).unwrap()).unwrap();
    assert_eq!(decoded.format_name(), "status_v1");
    assert_eq!(decoded.data_name(), "node0");
    assert_eq!(decoded.revision(), 3);
    let names: Vec<&str> = decoded.field_names().collect();
    assert_eq!(names, ["runno", "rate"]);
    assert_eq!(decoded.get::<i32>("runno", 0).unwrap(), 12345);
    assert_eq!(decoded.get::<f32>("rate", 3).unwrap(), 100.25);
    assert_eq!(decoded, r);
}

#[test]
fn scalar_flags_scenario() {
    let mut r = Record::new("status_v1", "node0", 3);
    r.declare("flags", ScalarType::UInt16, 0).unwrap();
    r.set("flags", 0, 7).unwrap();
    assert_eq!(r.get::<u16>("flags", 0).unwrap(), 7);
    assert!(matches!(
        r.get::<u16>("flags", 1),
        Err(StoreError::IndexOutOfRange { index: 1, len: 1, .. })
    ));
    assert!(matches!(
        r.get::<u16>("missing", 0),
        Err(StoreError::UnknownField(_))
    ));
}

#[test]
fn consumer_probes_after_revision_drift() {
    let mut newer = storage_status().clone_with_revision(4);
    newer.put("rate", ScalarType::Float64, 4).unwrap();
    let received = codec::decode(&codec::encode(&newer).unwrap()).unwrap();

    let expect = FormatExpectation::new("storage_status")
        .revision(3)
        .field("rate", ScalarType::Float32);
    let Verdict::Drifted(drift) = expect.evaluate(&received) else {
        panic!("expected drift");
    };
    assert_eq!(drift.retyped.len(), 1);
    assert_eq!(
        received.field_info("rate").unwrap().scalar_type,
        ScalarType::Float64
    );
    // Still readable through the widened view.
    assert_eq!(received.get::<f64>("rate", 0).unwrap(), 0.0);
}

#[test]
fn byte_size_is_taken_from_the_wire() {
    let mut bytes = codec::encode(&storage_status()).unwrap();
    // Header: string "store01", string "storage_status", revision, byte size.
    let byte_size_at = 4 + 7 + 4 + 14 + 4;
    bytes[byte_size_at..byte_size_at + 4].copy_from_slice(&999i32.to_be_bytes());
    let received = codec::decode(&bytes).unwrap();
    assert_eq!(received.byte_size(), 999);
    assert_eq!(received.payload_size(), 44);
}

fn random_value(rng: &mut fastrand::Rng, ty: ScalarType) -> ScalarValue {
    match ty {
        ScalarType::Int8 => ScalarValue::I8(rng.i8(..)),
        ScalarType::Int16 => ScalarValue::I16(rng.i16(..)),
        ScalarType::Int32 => ScalarValue::I32(rng.i32(..)),
        ScalarType::Int64 => ScalarValue::I64(rng.i64(..)),
        ScalarType::UInt8 => ScalarValue::U8(rng.u8(..)),
        ScalarType::UInt16 => ScalarValue::U16(rng.u16(..)),
        ScalarType::UInt32 => ScalarValue::U32(rng.u32(..)),
        ScalarType::UInt64 => ScalarValue::U64(rng.u64(..)),
        ScalarType::Float32 => ScalarValue::F32(f32::from_bits(rng.u32(..))),
        ScalarType::Float64 => ScalarValue::F64((rng.f64() - 0.5) * 1e12),
    }
}

fn random_record(rng: &mut fastrand::Rng) -> Record {
    let mut r = Record::new(
        format!("fmt{}", rng.u8(..)),
        format!("node{}", rng.u16(..)),
        rng.i32(..),
    );
    for i in 0..rng.usize(0..12) {
        let ty = ScalarType::ALL[rng.usize(..ScalarType::ALL.len())];
        let length = rng.usize(0..9);
        let name = format!("f{}_{}", i, ty);
        r.declare(&name, ty, length).unwrap();
        for index in 0..length.max(1) {
            r.set(&name, index, random_value(rng, ty)).unwrap();
        }
    }
    r
}

#[test]
fn randomized_roundtrip() {
    let mut rng = fastrand::Rng::with_seed(0x5747_5245);
    for _ in 0..500 {
        let original = random_record(&mut rng);
        let bytes = codec::encode(&original).unwrap();
        assert_eq!(bytes.len(), codec::encoded_len(&original));
        let decoded = codec::decode(&bytes).unwrap();

        assert_eq!(decoded.len(), original.len());
        assert_eq!(decoded.revision(), original.revision());
        for (a, b) in original.fields().zip(decoded.fields()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.info(), b.info());
            // Bit-level comparison so NaN payloads count as equal.
            match (a.values(), b.values()) {
                (FieldValues::F32(x), FieldValues::F32(y)) => {
                    let x: Vec<u32> = x.iter().map(|v| v.to_bits()).collect();
                    let y: Vec<u32> = y.iter().map(|v| v.to_bits()).collect();
                    assert_eq!(x, y);
                }
                (x, y) => assert_eq!(x, y),
            }
        }
        assert_eq!(codec::encode(&decoded).unwrap(), bytes);
    }
}

#[test]
fn stream_file_with_snapshot_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.srs");

    let mut writer = RecordStreamWriter::create(&path).unwrap();
    let mut r = storage_status();
    for runno in 0..5 {
        r.set("runno", 0, runno).unwrap();
        writer.write_record(&r).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    let store = SnapshotStore::new();
    let handle = store.handle("storage_status", "store01");
    let mut reader = RecordStreamReader::open(&path).unwrap();
    while let Some(record) = reader.next_record().unwrap() {
        store.publish(record);
    }

    assert_eq!(
        reader.stats(),
        StreamStats {
            frames_read: 5,
            records_decoded: 5,
            frames_discarded: 0
        }
    );
    assert_eq!(handle.load().unwrap().get::<i32>("runno", 0).unwrap(), 4);
    assert_eq!(store.stats().published, 5);
}

#[cfg(feature = "serde")]
#[test]
fn json_view_matches_accessors() {
    let json = serde_json::to_value(storage_status()).unwrap();
    assert_eq!(json["format"], "storage_status");
    assert_eq!(json["fields"][0]["values"][0], 12345);
    assert_eq!(json["fields"][2]["type"], "uint32");
    assert_eq!(json["fields"][2]["values"][1], 4_000_000_000u64);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn records_decode_on_many_threads() {
    assert_send_sync::<Record>();
    assert_send_sync::<SnapshotStore>();

    let bytes = std::sync::Arc::new(codec::encode(&storage_status()).unwrap());
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bytes = std::sync::Arc::clone(&bytes);
            std::thread::spawn(move || {
                (0..200)
                    .map(|_| codec::decode(&bytes).unwrap())
                    .last()
                    .unwrap()
            })
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), storage_status());
    }
}

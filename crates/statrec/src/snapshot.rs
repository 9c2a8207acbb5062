// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Latest-record store, one slot per (format name, data name).
//!
//! # Concurrency
//!
//! - **Lock-free reads**: each slot is an `ArcSwapOption<Record>`; readers get
//!   an immutable `Arc<Record>` and never observe a half-updated record.
//! - **Sharded index**: `DashMap` maps keys to slots.
//! - **Cheap to share**: clones share the same internals.
//!
//! # Example
//!
//! ```
//! use statrec::{codec, Record, ScalarType, SnapshotStore};
//!
//! let store = SnapshotStore::new();
//! let rate = store.handle("storage_status", "store01");
//! assert!(rate.load().is_none());
//!
//! let mut r = Record::new("storage_status", "store01", 3);
//! r.declare("runno", ScalarType::Int32, 0)?;
//! store.ingest(&codec::encode(&r)?)?;
//!
//! assert_eq!(rate.load().map(|r| r.revision()), Some(3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::codec::{self, CodecError, DecodeLimits};
use crate::record::Record;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub format_name: String,
    pub data_name: String,
}

impl SnapshotKey {
    pub fn new(format_name: impl Into<String>, data_name: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            data_name: data_name.into(),
        }
    }

    pub fn of(record: &Record) -> Self {
        Self::new(record.format_name(), record.data_name())
    }
}

type Slot = Arc<ArcSwapOption<Record>>;

/// Ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub published: u64,
    pub rejected: u64,
}

/// Shared "latest record" store.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    slots: Arc<DashMap<SnapshotKey, Slot>>,
    published: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: SnapshotKey) -> Slot {
        let entry = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(ArcSwapOption::empty()));
        Arc::clone(entry.value())
    }

    /// Replace the latest snapshot for the record's key.
    pub fn publish(&self, record: Record) -> Arc<Record> {
        let key = SnapshotKey::of(&record);
        let snapshot = Arc::new(record);
        debug!(
            format = %key.format_name,
            data = %key.data_name,
            revision = snapshot.revision(),
            "publish snapshot"
        );
        self.slot(key).store(Some(Arc::clone(&snapshot)));
        self.published.fetch_add(1, Ordering::Relaxed);
        snapshot
    }

    /// Decode and publish. On error the previous snapshot stays in place.
    pub fn ingest(&self, bytes: &[u8]) -> Result<Arc<Record>, CodecError> {
        self.ingest_with_limits(bytes, &DecodeLimits::default())
    }

    pub fn ingest_with_limits(
        &self,
        bytes: &[u8],
        limits: &DecodeLimits,
    ) -> Result<Arc<Record>, CodecError> {
        match codec::decode_with_limits(bytes, limits) {
            Ok(record) => Ok(self.publish(record)),
            Err(e) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, len = bytes.len(), "rejected record");
                Err(e)
            }
        }
    }

    /// Current snapshot, if any has been published.
    pub fn latest(&self, format_name: &str, data_name: &str) -> Option<Arc<Record>> {
        let key = SnapshotKey::new(format_name, data_name);
        self.slots.get(&key).and_then(|slot| slot.load_full())
    }

    /// Long-lived reader for one key. The handle sees every later publish,
    /// including ones for keys not yet published when it was created.
    pub fn handle(&self, format_name: &str, data_name: &str) -> SnapshotHandle {
        let key = SnapshotKey::new(format_name, data_name);
        SnapshotHandle {
            slot: self.slot(key.clone()),
            key,
        }
    }

    /// Keys that currently hold a snapshot, sorted.
    pub fn keys(&self) -> Vec<SnapshotKey> {
        let mut keys: Vec<SnapshotKey> = self
            .slots
            .iter()
            .filter(|entry| entry.value().load().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of keys holding a snapshot.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().load().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear a slot and return what it held. Existing handles stay attached
    /// and see the next publish; a slot nobody holds is dropped from the index.
    pub fn remove(&self, format_name: &str, data_name: &str) -> Option<Arc<Record>> {
        let key = SnapshotKey::new(format_name, data_name);
        let previous = self.slots.get(&key).and_then(|slot| slot.swap(None));
        self.slots.remove_if(&key, |_, slot| is_unused(slot));
        previous
    }

    /// Drop empty slots that no handle holds, e.g. left behind by handles
    /// for keys that were never published. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !is_unused(slot));
        let pruned = before.saturating_sub(self.slots.len());
        if pruned > 0 {
            debug!(pruned, "pruned snapshot slots");
        }
        pruned
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            published: self.published.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

// Checked under the shard lock: `slot()` clones under the same lock, and a
// publish in flight still holds its clone.
fn is_unused(slot: &Slot) -> bool {
    Arc::strong_count(slot) == 1 && slot.load().is_none()
}

/// Reader bound to one snapshot slot.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    key: SnapshotKey,
    slot: Slot,
}

impl SnapshotHandle {
    pub fn key(&self) -> &SnapshotKey {
        &self.key
    }

    /// Current snapshot, `None` before the first publish.
    pub fn load(&self) -> Option<Arc<Record>> {
        self.slot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::ScalarType;
    use std::thread;

    fn status(data: &str, runno: i32) -> Record {
        let mut r = Record::new("storage_status", data, 3);
        r.add("runno", runno, 0).unwrap();
        r
    }

    #[test]
    fn test_publish_replaces() {
        let store = SnapshotStore::new();
        assert!(store.latest("storage_status", "store01").is_none());

        store.publish(status("store01", 1));
        store.publish(status("store01", 2));
        let latest = store.latest("storage_status", "store01").unwrap();
        assert_eq!(latest.get::<i32>("runno", 0).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().published, 2);
    }

    #[test]
    fn test_rejected_ingest_keeps_previous() {
        let store = SnapshotStore::new();
        let good = codec::encode(&status("store01", 7)).unwrap();
        store.ingest(&good).unwrap();

        let mut bad = codec::encode(&status("store01", 8)).unwrap();
        bad.truncate(bad.len() - 2);
        assert!(matches!(
            store.ingest(&bad),
            Err(CodecError::TruncatedRecord { .. })
        ));

        let latest = store.latest("storage_status", "store01").unwrap();
        assert_eq!(latest.get::<i32>("runno", 0).unwrap(), 7);
        assert_eq!(
            store.stats(),
            SnapshotStats {
                published: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn test_handle_follows_replacements() {
        let store = SnapshotStore::new();
        let handle = store.handle("storage_status", "store02");
        assert!(handle.load().is_none());
        assert!(store.is_empty());

        store.publish(status("store02", 1));
        let first = handle.load().unwrap();
        store.publish(status("store02", 2));

        assert_eq!(first.get::<i32>("runno", 0).unwrap(), 1);
        assert_eq!(handle.load().unwrap().get::<i32>("runno", 0).unwrap(), 2);
        assert_eq!(handle.key(), &SnapshotKey::new("storage_status", "store02"));
    }

    #[test]
    fn test_keys_and_remove() {
        let store = SnapshotStore::new();
        let handle = store.handle("storage_status", "b");
        store.publish(status("b", 1));
        store.publish(status("a", 1));
        assert_eq!(
            store.keys(),
            [
                SnapshotKey::new("storage_status", "a"),
                SnapshotKey::new("storage_status", "b")
            ]
        );

        assert!(store.remove("storage_status", "b").is_some());
        assert!(handle.load().is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove("storage_status", "zzz").is_none());

        store.publish(status("b", 5));
        assert_eq!(handle.load().unwrap().get::<i32>("runno", 0).unwrap(), 5);
    }

    #[test]
    fn test_remove_drops_unheld_slots() {
        let store = SnapshotStore::new();
        for i in 0..100 {
            let data = format!("node{i}");
            store.publish(status(&data, i));
            assert!(store.remove("storage_status", &data).is_some());
        }
        assert_eq!(store.slots.len(), 0);

        let handle = store.handle("storage_status", "kept");
        store.publish(status("kept", 1));
        assert!(store.remove("storage_status", "kept").is_some());
        assert_eq!(store.slots.len(), 1);
        store.publish(status("kept", 2));
        assert_eq!(handle.load().unwrap().get::<i32>("runno", 0).unwrap(), 2);

        drop(handle);
        assert!(store.remove("storage_status", "kept").is_some());
        assert_eq!(store.slots.len(), 0);
    }

    #[test]
    fn test_prune_drops_abandoned_handles() {
        let store = SnapshotStore::new();
        for i in 0..50 {
            drop(store.handle("storage_status", &format!("ghost{i}")));
        }
        let held = store.handle("storage_status", "held");
        store.publish(status("live", 1));
        assert_eq!(store.slots.len(), 52);

        assert_eq!(store.prune(), 50);
        assert_eq!(store.slots.len(), 2);
        assert_eq!(store.keys(), [SnapshotKey::new("storage_status", "live")]);
        assert_eq!(held.key().data_name, "held");
        assert_eq!(store.prune(), 0);
    }

    #[test]
    fn test_concurrent_readers_see_whole_records() {
        let store = SnapshotStore::new();
        let mut seed = Record::new("storage_status", "store01", 3);
        seed.add("a", 0i64, 0).unwrap();
        seed.add("b", 0i64, 0).unwrap();
        store.publish(seed.clone());

        let reader = {
            let handle = store.handle("storage_status", "store01");
            thread::spawn(move || {
                for _ in 0..1000 {
                    let snap = handle.load().unwrap();
                    assert_eq!(
                        snap.get::<i64>("a", 0).unwrap(),
                        snap.get::<i64>("b", 0).unwrap()
                    );
                }
            })
        };

        for i in 1..=200i64 {
            let mut next = seed.clone();
            next.set("a", 0, i).unwrap();
            next.set("b", 0, i).unwrap();
            store.publish(next);
        }
        reader.join().unwrap();
        let last = store.latest("storage_status", "store01").unwrap();
        assert_eq!(last.get::<i64>("a", 0).unwrap(), 200);
        assert_eq!(last.field_info("b").unwrap().scalar_type, ScalarType::Int64);
    }
}

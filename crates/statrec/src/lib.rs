// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # statrec
//!
//! Self-describing typed status records for DAQ monitoring.
//!
//! A producer node fills a [`Record`] with live measurements (run numbers,
//! queue depths, event rates) and ships the encoded bytes over a pub/sub
//! bus. Consumers only know the negotiated format name and revision; field
//! names, types and array lengths come from the record itself.
//!
//! ## Layers
//!
//! - [`scalar`]: closed set of wire types and the exact-value conversion
//!   policy.
//! - [`record`]: the typed value store.
//! - [`codec`]: deterministic big-endian encode/decode with resource limits.
//! - [`negotiate`]: consumer-side format and revision checks.
//! - [`snapshot`]: latest record per (format, data name), swapped atomically.
//! - [`stream`]: length-prefixed, CRC-checked frames for files and pipes.
//!
//! ## Example
//!
//! ```
//! use statrec::{codec, FormatExpectation, Record, ScalarType, Verdict};
//!
//! let mut status = Record::new("storage_status", "store01", 3);
//! status.declare("runno", ScalarType::Int32, 0)?;
//! status.declare("rate", ScalarType::Float32, 4)?;
//! status.set("runno", 0, 12345)?;
//!
//! let bytes = codec::encode(&status)?;
//! let received = codec::decode(&bytes)?;
//!
//! let expect = FormatExpectation::new("storage_status").revision(3);
//! assert_eq!(expect.evaluate(&received), Verdict::Compatible);
//! assert_eq!(received.get::<i64>("runno", 0)?, 12345);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
mod display;
pub mod negotiate;
pub mod record;
pub mod scalar;
pub mod snapshot;
pub mod stream;

pub use codec::{decode, encode, CodecError, DecodeLimits};
pub use negotiate::{Drift, FormatExpectation, Verdict};
pub use record::{Field, FieldInfo, FieldValues, Record, StoreError};
pub use scalar::{Scalar, ScalarType, ScalarValue};
pub use snapshot::{SnapshotHandle, SnapshotKey, SnapshotStore};
pub use stream::{RecordStreamReader, RecordStreamWriter, StreamError};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Format/revision negotiation.
//!
//! A consumer is configured with the format name it understands, optionally a
//! revision and the fields it relies on. Records of other formats are skipped
//! (`Verdict::NotMine`). A record of the right format whose revision or
//! layout differs is still usable; the verdict only reports the drift so the
//! consumer can probe `field_info` before reading.

use crate::record::Record;
use crate::scalar::ScalarType;

/// What a consumer expects from the records it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatExpectation {
    format_name: String,
    revision: Option<i32>,
    fields: Vec<(String, ScalarType)>,
}

impl FormatExpectation {
    pub fn new(format_name: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            revision: None,
            fields: Vec::new(),
        }
    }

    /// Expect a specific revision.
    pub fn revision(mut self, revision: i32) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Expect a field with the given type.
    pub fn field(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    pub fn expected_revision(&self) -> Option<i32> {
        self.revision
    }

    /// True if the record carries this format name.
    pub fn matches(&self, record: &Record) -> bool {
        record.format_name() == self.format_name
    }

    pub fn evaluate(&self, record: &Record) -> Verdict {
        if !self.matches(record) {
            return Verdict::NotMine;
        }

        let mut drift = Drift::default();
        if let Some(expected) = self.revision {
            if expected != record.revision() {
                drift.revision = Some(RevisionChange {
                    expected,
                    actual: record.revision(),
                });
            }
        }
        for (name, expected) in &self.fields {
            match record.field_info(name) {
                Ok(info) if info.scalar_type == *expected => {}
                Ok(info) => drift.retyped.push(Retyped {
                    name: name.clone(),
                    expected: *expected,
                    actual: info.scalar_type,
                }),
                Err(_) => drift.missing.push(name.clone()),
            }
        }

        if drift.is_empty() {
            Verdict::Compatible
        } else {
            Verdict::Drifted(drift)
        }
    }
}

/// Outcome of checking a record against a [`FormatExpectation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Different format; skip silently.
    NotMine,
    Compatible,
    /// Right format, different revision or layout. The record is still usable.
    Drifted(Drift),
}

impl Verdict {
    pub fn is_mine(&self) -> bool {
        !matches!(self, Verdict::NotMine)
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Verdict::Compatible)
    }
}

/// Differences between the expected and the received layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    pub revision: Option<RevisionChange>,
    /// Expected fields absent from the record.
    pub missing: Vec<String>,
    /// Expected fields present with another type.
    pub retyped: Vec<Retyped>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.revision.is_none() && self.missing.is_empty() && self.retyped.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionChange {
    pub expected: i32,
    pub actual: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retyped {
    pub name: String,
    pub expected: ScalarType,
    pub actual: ScalarType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(revision: i32) -> Record {
        let mut r = Record::new("storage_status", "store01", revision);
        r.declare("runno", ScalarType::Int32, 0).unwrap();
        r.declare("rate", ScalarType::Float32, 4).unwrap();
        r
    }

    #[test]
    fn test_other_format_is_not_mine() {
        let expect = FormatExpectation::new("hlt_status");
        assert!(!expect.matches(&record(3)));
        assert_eq!(expect.evaluate(&record(3)), Verdict::NotMine);
        assert!(!Verdict::NotMine.is_mine());
    }

    #[test]
    fn test_compatible() {
        let expect = FormatExpectation::new("storage_status")
            .revision(3)
            .field("runno", ScalarType::Int32);
        let verdict = expect.evaluate(&record(3));
        assert!(verdict.is_compatible());
        assert!(verdict.is_mine());

        // Unspecified revision accepts anything.
        let loose = FormatExpectation::new("storage_status");
        assert!(loose.evaluate(&record(99)).is_compatible());
    }

    #[test]
    fn test_revision_drift_is_advisory() {
        let expect = FormatExpectation::new("storage_status").revision(3);
        let r = record(4);
        match expect.evaluate(&r) {
            Verdict::Drifted(drift) => {
                assert_eq!(
                    drift.revision,
                    Some(RevisionChange {
                        expected: 3,
                        actual: 4
                    })
                );
                assert!(drift.missing.is_empty());
            }
            other => panic!("expected drift, got {:?}", other),
        }
        assert_eq!(r.field_info("runno").unwrap().scalar_type, ScalarType::Int32);
    }

    #[test]
    fn test_missing_and_retyped_fields() {
        let expect = FormatExpectation::new("storage_status")
            .field("runno", ScalarType::Int64)
            .field("disk", ScalarType::Float32)
            .field("rate", ScalarType::Float32);
        let Verdict::Drifted(drift) = expect.evaluate(&record(3)) else {
            panic!("expected drift");
        };
        assert_eq!(drift.revision, None);
        assert_eq!(drift.missing, ["disk"]);
        assert_eq!(
            drift.retyped,
            [Retyped {
                name: "runno".into(),
                expected: ScalarType::Int64,
                actual: ScalarType::Int32
            }]
        );
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text and JSON views of a record.
//!
//! The text form is one header line then one line per element:
//!
//! ```text
//! store01 (storage_status rev 3, 2 fields, 12 bytes)
//!   runno : int32(12345)
//!   rate[0] : float32(0)
//!   rate[1] : float32(1.5)
//! ```

use crate::record::{Field, Record};
use std::fmt;

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.scalar_type();
        if self.is_array() {
            for (i, value) in self.values().iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}[{}] : {}({})", self.name(), i, ty, value)?;
            }
            Ok(())
        } else {
            match self.values().get(0) {
                Some(value) => write!(f, "{} : {}({})", self.name(), ty, value),
                None => write!(f, "{} : {}()", self.name(), ty),
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} rev {}, {} fields, {} bytes)",
            self.data_name(),
            self.format_name(),
            self.revision(),
            self.len(),
            self.byte_size()
        )?;
        for field in self.fields() {
            for line in field.to_string().lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::ser::{Serialize, SerializeStruct, Serializer};

    impl Serialize for Field {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Field", 4)?;
            state.serialize_field("name", self.name())?;
            state.serialize_field("type", &self.scalar_type())?;
            state.serialize_field("length", &self.length())?;
            state.serialize_field("values", self.values())?;
            state.end()
        }
    }

    impl Serialize for Record {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let fields: Vec<&Field> = self.fields().collect();
            let mut state = serializer.serialize_struct("Record", 5)?;
            state.serialize_field("format", self.format_name())?;
            state.serialize_field("data", self.data_name())?;
            state.serialize_field("revision", &self.revision())?;
            state.serialize_field("byte_size", &self.byte_size())?;
            state.serialize_field("fields", &fields)?;
            state.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::record::Record;
    use crate::scalar::ScalarType;

    fn sample() -> Record {
        let mut r = Record::new("storage_status", "store01", 3);
        r.declare("runno", ScalarType::Int32, 0).unwrap();
        r.declare("rate", ScalarType::Float32, 2).unwrap();
        r.set("runno", 0, 12345).unwrap();
        r.set("rate", 1, 1.5f32).unwrap();
        r
    }

    #[test]
    fn test_text_rendering() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "store01 (storage_status rev 3, 2 fields, 12 bytes)",
                "  runno : int32(12345)",
                "  rate[0] : float32(0)",
                "  rate[1] : float32(1.5)",
            ]
        );
    }

    #[test]
    fn test_empty_record_is_header_only() {
        let r = Record::new("f", "d", 0);
        assert_eq!(r.to_string(), "d (f rev 0, 0 fields, 0 bytes)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_view() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "format": "storage_status",
                "data": "store01",
                "revision": 3,
                "byte_size": 12,
                "fields": [
                    {"name": "runno", "type": "int32", "length": 0, "values": [12345]},
                    {"name": "rate", "type": "float32", "length": 2, "values": [0.0, 1.5]},
                ]
            })
        );
    }
}

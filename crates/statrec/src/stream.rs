// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Framed record streams.
//!
//! # Frame Format
//!
//! ```text
//! +------------------------------------------------------------+
//! | payload_len (4, BE) | payload (encoded record) | CRC32 (4, BE) |
//! +------------------------------------------------------------+
//! ```
//!
//! The CRC covers the payload only. A frame whose checksum or payload is bad
//! is consumed and reported as a recoverable error; the next frame is read
//! normally. A length beyond `DecodeLimits::max_record_bytes` means the
//! stream is out of sync and ends iteration.

use crate::codec::{self, CodecError, DecodeLimits};
use crate::record::Record;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Stream framing errors.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame {frame}: {len} bytes exceeds limit {max}")]
    FrameTooLarge { frame: u64, len: usize, max: usize },

    #[error("frame {frame}: CRC mismatch (expected {expected:#010x}, got {actual:#010x})")]
    Checksum { frame: u64, expected: u32, actual: u32 },

    #[error("frame {frame}: {source}")]
    Codec {
        frame: u64,
        #[source]
        source: CodecError,
    },
}

impl StreamError {
    /// True if the bad frame was consumed and reading can go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamError::Checksum { .. } | StreamError::Codec { .. })
    }
}

/// Writes records as checksummed frames.
pub struct RecordStreamWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl RecordStreamWriter<BufWriter<File>> {
    /// Create (or truncate) a stream file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// Encode and frame one record.
    pub fn write_record(&mut self, record: &Record) -> Result<(), StreamError> {
        let payload = codec::encode(record).map_err(|source| StreamError::Codec {
            frame: self.frames_written,
            source,
        })?;
        self.write_encoded(&payload)
    }

    /// Frame an already-encoded payload as is.
    pub fn write_encoded(&mut self, payload: &[u8]) -> Result<(), StreamError> {
        let len = u32::try_from(payload.len()).map_err(|_| StreamError::FrameTooLarge {
            frame: self.frames_written,
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        self.writer.write_u32::<BigEndian>(len)?;
        self.writer.write_all(payload)?;
        self.writer.write_u32::<BigEndian>(crc32fast::hash(payload))?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reader counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames fully read, good or bad.
    pub frames_read: u64,
    pub records_decoded: u64,
    /// Frames dropped for a checksum or codec error.
    pub frames_discarded: u64,
}

/// Reads framed records, skipping bad frames.
pub struct RecordStreamReader<R: Read> {
    reader: R,
    limits: DecodeLimits,
    buffer: Vec<u8>,
    stats: StreamStats,
    finished: bool,
}

impl RecordStreamReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordStreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, DecodeLimits::default())
    }

    pub fn with_limits(reader: R, limits: DecodeLimits) -> Self {
        Self {
            reader,
            limits,
            buffer: Vec::new(),
            stats: StreamStats::default(),
            finished: false,
        }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Read the next frame's payload without decoding it.
    ///
    /// Returns `Ok(None)` on a clean end of stream.
    pub fn next_payload(&mut self) -> Result<Option<&[u8]>, StreamError> {
        let frame = self.stats.frames_read;
        let len = match self.read_frame_len()? {
            Some(len) => len as usize,
            None => return Ok(None),
        };
        if len > self.limits.max_record_bytes {
            return Err(StreamError::FrameTooLarge {
                frame,
                len,
                max: self.limits.max_record_bytes,
            });
        }

        self.buffer.resize(len, 0);
        self.reader.read_exact(&mut self.buffer)?;
        let expected = self.reader.read_u32::<BigEndian>()?;
        self.stats.frames_read += 1;

        let actual = crc32fast::hash(&self.buffer);
        if actual != expected {
            self.stats.frames_discarded += 1;
            warn!(frame, len, "discarding frame: CRC mismatch");
            return Err(StreamError::Checksum {
                frame,
                expected,
                actual,
            });
        }
        Ok(Some(self.buffer.as_slice()))
    }

    /// Read and decode the next record.
    pub fn next_record(&mut self) -> Result<Option<Record>, StreamError> {
        let frame = self.stats.frames_read;
        let limits = self.limits;
        let decoded = match self.next_payload()? {
            Some(payload) => codec::decode_with_limits(payload, &limits),
            None => return Ok(None),
        };
        match decoded {
            Ok(record) => {
                self.stats.records_decoded += 1;
                debug!(frame, data = record.data_name(), "read record");
                Ok(Some(record))
            }
            Err(source) => {
                self.stats.frames_discarded += 1;
                warn!(frame, error = %source, "discarding frame: undecodable record");
                Err(StreamError::Codec { frame, source })
            }
        }
    }

    /// Frame length, or `None` at a clean end of stream.
    fn read_frame_len(&mut self) -> io::Result<Option<u32>> {
        let mut header = [0u8; 4];
        let mut filled = 0;
        while filled < header.len() {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a frame header",
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Some(BigEndian::read_u32(&header)))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for RecordStreamReader<R> {
    type Item = Result<Record, StreamError>;

    /// Yields recoverable errors and keeps going; stops after a fatal one.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if !e.is_recoverable() {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }
}

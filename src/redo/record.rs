//! Redo log records
//!
//! Defines the structure of a single journal record and its on-disk frame.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Frame header: payload length (4) + CRC32 of payload (4)
pub const HEADER_SIZE: usize = 8;

/// Largest payload accepted when reading a frame (64 MB)
pub const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// Kind of mutation a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Insert,
    Delete,
}

/// One mutation of the storage table, in application order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Position in the global mutation order
    pub serial: u64,

    pub operation: Operation,

    pub key: String,

    /// Present only for `Insert`
    pub value: Option<String>,
}

impl LogRecord {
    pub fn insert(serial: u64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            serial,
            operation: Operation::Insert,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn delete(serial: u64, key: impl Into<String>) -> Self {
        Self {
            serial,
            operation: Operation::Delete,
            key: key.into(),
            value: None,
        }
    }

    /// Check that the value is present exactly when the operation needs one
    pub fn validate(&self) -> Result<()> {
        match (self.operation, &self.value) {
            (Operation::Insert, None) => Err(KvError::InvalidRecord(format!(
                "insert of '{}' carries no value",
                self.key
            ))),
            (Operation::Delete, Some(_)) => Err(KvError::InvalidRecord(format!(
                "delete of '{}' carries a value",
                self.key
            ))),
            _ => Ok(()),
        }
    }

    /// Encode into a complete frame: len (4) + crc (4) + payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let payload = bincode::serialize(self)?;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_RECORD_SIZE)
            .ok_or_else(|| {
                KvError::InvalidRecord(format!("record of {} bytes is too large", payload.len()))
            })?;

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_u32_le(len);
        frame.put_u32_le(crc32fast::hash(&payload));
        frame.put_slice(&payload);

        Ok(frame.to_vec())
    }

    /// Decode a frame payload after checking it against the header checksum
    pub fn decode_payload(payload: &[u8], expected_crc: u32) -> Result<Self> {
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(KvError::InvalidRecord(format!(
                "checksum mismatch (expected {:08x}, got {:08x})",
                expected_crc, actual_crc
            )));
        }

        let record: LogRecord = bincode::deserialize(payload)?;
        record.validate()?;
        Ok(record)
    }
}

/// Split a frame header into (payload length, crc)
pub fn parse_header(header: &[u8; HEADER_SIZE]) -> (u32, u32) {
    let mut buf = &header[..];
    let len = buf.get_u32_le();
    let crc = buf.get_u32_le();
    (len, crc)
}

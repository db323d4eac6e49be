//! Redo log reader
//!
//! Reads framed records from a log file in order.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{KvError, Result};

use super::record::{parse_header, HEADER_SIZE, MAX_RECORD_SIZE};
use super::LogRecord;

/// Reads records from a redo log file
pub struct RedoReader {
    reader: BufReader<File>,

    /// End offset of the last record returned
    offset: u64,
}

impl RedoReader {
    /// Open a redo log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
        })
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of file. An incomplete or damaged
    /// frame yields `RedoCorruption` with the offset where it starts; the
    /// reader must not be used after that.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(self.corruption(format!(
                "truncated header ({} of {} bytes)",
                got, HEADER_SIZE
            )));
        }

        let (len, crc) = parse_header(&header);
        if len > MAX_RECORD_SIZE {
            return Err(self.corruption(format!(
                "record length {} exceeds limit {}",
                len, MAX_RECORD_SIZE
            )));
        }

        let mut payload = vec![0u8; len as usize];
        let got = read_full(&mut self.reader, &mut payload)?;
        if got < payload.len() {
            return Err(self.corruption(format!(
                "truncated payload ({} of {} bytes)",
                got,
                payload.len()
            )));
        }

        let record = LogRecord::decode_payload(&payload, crc)
            .map_err(|e| self.corruption(e.to_string()))?;

        self.offset += (HEADER_SIZE + payload.len()) as u64;
        Ok(Some(record))
    }

    /// Byte offset just past the last record returned
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Iterate over records until end of file or the first damaged frame
    pub fn records(self) -> RedoIterator {
        RedoIterator {
            reader: self,
            done: false,
        }
    }

    fn corruption(&self, reason: String) -> KvError {
        KvError::RedoCorruption {
            offset: self.offset,
            reason,
        }
    }
}

/// Iterator over redo log records
pub struct RedoIterator {
    reader: RedoReader,
    done: bool,
}

impl Iterator for RedoIterator {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the stream allows, returning the bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

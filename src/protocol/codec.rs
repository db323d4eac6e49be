//! Line codec
//!
//! Reading and writing newline-delimited protocol lines on a stream.
//!
//! ## Wire Format
//! ```text
//! request:  <verb> <arg1> <arg2> ...\n
//! reply:    OK: <payload>\r\n   |   ERR: <message>\r\n
//! ```

use std::io::{BufRead, Read, Write};

use crate::error::{KvError, Result};

use super::{Command, Reply};

/// Longest accepted request line, terminator included
pub const MAX_LINE: usize = 64 * 1024;

/// Read one `\n`-terminated line
///
/// Returns `Ok(None)` once the peer is gone. A partial line left at end of
/// stream is dropped. A complete line that is not UTF-8, or one longer than
/// [`MAX_LINE`], is consumed and reported as `Protocol`, so the caller can
/// answer it and keep reading.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader.by_ref().take(MAX_LINE as u64).read_until(b'\n', &mut buf)?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        if n < MAX_LINE || !skip_line(reader)? {
            return Ok(None);
        }
        return Err(KvError::Protocol(format!("request longer than {} bytes", MAX_LINE)));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| KvError::Protocol("request is not valid UTF-8".to_string()))
}

/// Discard input up to and including the next `\n`; false at end of stream
fn skip_line<R: BufRead>(reader: &mut R) -> Result<bool> {
    loop {
        let (found, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(false);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        reader.consume(used);

        if found {
            return Ok(true);
        }
    }
}

/// Write a reply line and flush
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    writer.write_all(reply.encode().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write a raw request line and flush
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write a command as a request line and flush
pub fn write_command<W: Write>(writer: &mut W, command: &Command<'_>) -> Result<()> {
    write_line(writer, &command.to_line())
}

/// Read and parse one reply line
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    match read_line(reader)? {
        Some(line) => Reply::parse(&line),
        None => Err(KvError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before reply",
        ))),
    }
}

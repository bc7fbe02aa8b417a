//! Message framing
//!
//! Each message is one JSON object followed by `\n`.
//!
//! ```text
//! {"category":"tracker","request":"get","values":{...}}\n
//! {"category":"heartbeat","statuscode":200}\n
//! ```
//!
//! A `\r` before the delimiter and blank lines are tolerated.

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{EyeTribeError, Result};

/// Frame delimiter
pub const DELIMITER: u8 = b'\n';

/// Size of each socket read
const READ_CHUNK: usize = 4096;

/// Splits a byte stream into frames
pub struct FrameReader<R> {
    reader: R,

    /// Bytes received but not yet returned as a frame
    buffer: BytesMut,

    max_frame_size: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, max_frame_size: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            max_frame_size,
        }
    }

    /// Read the next frame, without its delimiter
    ///
    /// Blocks until a full frame is buffered. Returns `None` on a clean EOF.
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(frame) = self.take_buffered()? {
                return Ok(Some(frame));
            }

            if self.buffer.len() > self.max_frame_size {
                return Err(self.oversized(self.buffer.len()));
            }

            let n = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                // Peer closed; flush a trailing frame sent without delimiter
                if is_blank(&self.buffer) {
                    self.buffer.clear();
                    return Ok(None);
                }
                return Ok(Some(self.buffer.split().freeze()));
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Pop the first complete, non-blank frame out of the buffer
    fn take_buffered(&mut self) -> Result<Option<Bytes>> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == DELIMITER) {
            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }

            if is_blank(&line) {
                continue;
            }
            if line.len() > self.max_frame_size {
                return Err(self.oversized(line.len()));
            }
            return Ok(Some(line.freeze()));
        }
        Ok(None)
    }

    fn oversized(&self, len: usize) -> EyeTribeError {
        EyeTribeError::Decoding(format!(
            "Frame too large: {} bytes (max {})",
            len, self.max_frame_size
        ))
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Write one frame and flush it
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    writer.write_all(payload)?;
    writer.write_all(&[DELIMITER])?;
    writer.flush()?;
    Ok(())
}

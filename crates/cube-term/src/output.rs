// SPDX-License-Identifier: MIT
//
// Frame buffer.
//
// The picker paints a whole frame into memory and the loop hands it to the
// terminal in one write_all. The terminal never shows half a frame, and
// escape sequences from two frames never interleave.

use std::io::{self, Write};

/// Room for a full-size frame: three 250-cell gradient bars at about 20
/// bytes per cell, plus the swatch.
const FRAME_CAPACITY: usize = 16_384;

/// One frame of escape sequences, written out with [`flush_to`](Self::flush_to).
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(FRAME_CAPACITY),
        }
    }

    /// Bytes painted so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the painted bytes, keeping the allocation for the next frame.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Hand the frame to `sink` in a single write and empty the buffer.
    ///
    /// An empty frame writes nothing. On error the frame is kept.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to or flushing `sink`.
    pub fn flush_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        sink.write_all(&self.buf)?;
        sink.flush()?;
        self.buf.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// No-op: bytes leave only through [`OutputBuffer::flush_to`].
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

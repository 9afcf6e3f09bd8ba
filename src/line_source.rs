//! Buffered line reader wrapping any `BufRead`, ticking a `ProgressSink`
//! every `chunk_size` lines.
//!
//! Grounded on the teacher's file-discovery module, which iterates a
//! `BufReader` line-by-line and maintains its own monotonic line
//! counter rather than relying on the iterator's internal state.

use crate::error::{EsoError, Result};
use crate::progress::ProgressSink;
use std::io::BufRead;

/// Single-pass, line-oriented reader over the `.eso` text stream.
pub struct LineSource<R: BufRead> {
    reader: R,
    line_counter: usize,
    chunk_size: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            line_counter: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn line_counter(&self) -> usize {
        self.line_counter
    }

    /// Reads the next line, stripping the trailing newline. Returns
    /// `Ok(None)` at EOF. Ticks `sink` every `chunk_size` lines and
    /// returns `EsoError::Cancelled` if `sink.should_cancel()` at that
    /// boundary.
    pub fn next_line(&mut self, sink: &mut dyn ProgressSink) -> Result<Option<String>> {
        let mut buf = String::new();
        let bytes_read = self.reader.read_line(&mut buf)?;
        if bytes_read == 0 {
            return Ok(None);
        }

        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }

        self.line_counter += 1;
        if self.line_counter % self.chunk_size == 0 {
            sink.tick();
            if sink.should_cancel() {
                return Err(EsoError::Cancelled);
            }
        }

        Ok(Some(buf))
    }
}

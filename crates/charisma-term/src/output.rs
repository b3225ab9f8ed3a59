// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// OutputBuffer accumulates all ANSI bytes for one frame in memory so the
// entire frame can be written in a single write() call. The terminal never
// sees a half-drawn frame, and we pay one syscall instead of hundreds.
//
// Growth is fallible. If the buffer cannot grow (allocator refusal, or the
// optional byte limit), the append is dropped whole and everything already
// in the buffer stays exactly as it was.

use std::io::{self, Write};

/// A byte buffer that accumulates ANSI output for a single `write()` call.
///
/// Default capacity: 16 KB — enough for most frames without reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
    limit: usize,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB) and no limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
            limit: usize::MAX,
        }
    }

    /// Create an empty buffer that never holds more than `limit` bytes.
    ///
    /// Appends that would cross the limit are dropped, exactly as if the
    /// allocator had refused to grow the buffer.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY.min(limit)),
            limit,
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `bytes` at the end of the buffer.
    ///
    /// Returns `false` if the buffer could not grow; in that case nothing
    /// was appended and the existing content is unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        let fits = self
            .buf
            .len()
            .checked_add(bytes.len())
            .is_some_and(|end| end <= self.limit);
        if !fits || self.buf.try_reserve(bytes.len()).is_err() {
            tracing::warn!(
                held = self.buf.len(),
                dropped = bytes.len(),
                "output buffer could not grow; append dropped"
            );
            return false;
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` in one `write_all` and clear the buffer.
    ///
    /// An empty buffer writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The buffer is left intact
    /// in that case.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    /// Each call is one [`append`](OutputBuffer::append): all or nothing.
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.append(buf) {
            Ok(buf.len())
        } else {
            Err(io::ErrorKind::OutOfMemory.into())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit — that's the renderer's job. This module
// just knows the byte-level encoding of every terminal command we need.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// Every function hands the writer one complete sequence in a single
// `write_all`. Sequences with numeric parameters are formatted into an
// `EscBuf` first, so a writer that refuses a chunk (see `OutputBuffer`)
// never ends up holding half a sequence.

use std::fmt;
use std::io::{self, Write};

// ─── EscBuf ──────────────────────────────────────────────────────────────────

/// A fixed-capacity stack buffer for composing short sequences.
///
/// Formatting past capacity fails with [`fmt::Error`] and leaves the
/// already-written prefix untouched — the caller decides what to do.
pub struct EscBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> EscBuf<N> {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The composed bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Append raw bytes, or fail without writing anything if they don't fit.
    ///
    /// # Errors
    ///
    /// Returns [`fmt::Error`] when `bytes` would exceed the capacity.
    pub fn push(&mut self, bytes: &[u8]) -> fmt::Result {
        let end = self.len.checked_add(bytes.len()).ok_or(fmt::Error)?;
        if end > N {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

impl<const N: usize> fmt::Write for EscBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes())
    }
}

impl<const N: usize> Default for EscBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity for a cursor-position sequence.
///
/// Worst case is two `i32::MIN` parameters: `ESC [ -2147483648 ; -2147483648 H`
/// is 26 bytes.
pub const CURSOR_SEQ_CAP: usize = 32;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed. Coordinates are
/// signed because the editor cursor is allowed to leave the screen; they
/// are encoded as-is and the terminal decides what to make of them.
///
/// # Errors
///
/// Propagates the writer's error.
pub fn cursor_to(w: &mut impl Write, x: i32, y: i32) -> io::Result<()> {
    let mut seq = EscBuf::<CURSOR_SEQ_CAP>::new();
    fmt::Write::write_fmt(
        &mut seq,
        format_args!("\x1b[{};{}H", y.saturating_add(1), x.saturating_add(1)),
    )
    .map_err(|_| io::Error::other("cursor sequence exceeds buffer"))?;
    w.write_all(seq.as_bytes())
}

/// Move the cursor to the top-left corner (CUP with no parameters).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Push the cursor 999 columns right and 999 rows down (CUF + CUD).
///
/// Both sequences stop at the screen edge, so the cursor ends up in the
/// bottom-right corner no matter how large the terminal is. CUP would not
/// work here: its behavior past the edge is undefined.
#[inline]
pub fn cursor_to_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[999C\x1b[999B")
}

/// Ask the terminal to report the cursor position (DSR 6).
///
/// The reply arrives on stdin as `ESC [ <row> ; <col> R`.
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear from the cursor to the end of the line (EL 0).
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte-level access to the terminal device.
//
// Everything the editor says to the terminal and everything it hears back
// goes through the `Tty` trait: one byte in (or nothing, if the raw-mode
// read timeout expired), arbitrary bytes out. The production implementation
// talks to fds 0 and 1 directly with libc read/write.
//
// Why not io::stdout()? Rust's stdout is line-buffered: a frame containing
// "\r\n" reaches the terminal as several write() calls, which is exactly
// the partial-frame flicker the output buffer exists to prevent. Writing to
// the fd ourselves keeps one frame = one write.

use std::io::{self, Write};

/// The terminal device, seen as a byte stream.
pub trait Tty: Write {
    /// Read a single byte.
    ///
    /// Returns `Ok(None)` when no byte arrived before the read timeout
    /// (or the read was interrupted / would block). Any other failure is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns the underlying OS error for failures other than "no data yet".
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// The process's controlling terminal: stdin for input, stdout for output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdTty;

impl StdTty {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Tty for StdTty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            // VMIN=0/VTIME=1: read returns 0 when the 100ms timeout expires.
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

impl Write for StdTty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::write(libc::STDOUT_FILENO, buf.as_ptr().cast(), buf.len())
            };
            if n >= 0 {
                #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        // Unbuffered: every write() already reached the fd.
        Ok(())
    }
}

/// Check whether stdin is connected to a terminal (TTY).
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

// ─── ScriptedTty ─────────────────────────────────────────────────────────────

/// An in-memory terminal that replays scripted input and records output.
///
/// Input is a queue of reads: `Some(byte)` delivers a byte, `None` is a
/// read that timed out. When the queue runs dry, reads keep timing out,
/// unless [`fail_when_drained`](Self::fail_when_drained) says otherwise.
#[derive(Debug, Default)]
pub struct ScriptedTty {
    input: std::collections::VecDeque<Option<u8>>,
    drained: Option<io::ErrorKind>,
    output: Vec<u8>,
    writes: usize,
}

impl ScriptedTty {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal whose input is exactly `bytes`, no timeouts in between.
    #[must_use]
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut tty = Self::new();
        tty.push_input(bytes);
        tty
    }

    /// Queue more input bytes.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied().map(Some));
    }

    /// Queue one read that times out with no data.
    pub fn push_timeout(&mut self) {
        self.input.push_back(None);
    }

    /// Once the script is exhausted, fail every read with `kind`.
    #[must_use]
    pub fn fail_when_drained(mut self, kind: io::ErrorKind) -> Self {
        self.drained = Some(kind);
        self
    }

    /// Everything written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Number of `write` calls received.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    /// Forget recorded output and the write count.
    pub fn clear_output(&mut self) {
        self.output.clear();
        self.writes = 0;
    }
}

impl Tty for ScriptedTty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.input.pop_front() {
            Some(read) => Ok(read),
            None => self.drained.map_or(Ok(None), |kind| Err(kind.into())),
        }
    }
}

impl Write for ScriptedTty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_tty_agrees_with_isatty() {
        let expected = unsafe { libc::isatty(libc::STDIN_FILENO) } == 1;
        assert_eq!(is_tty(), expected);
    }

    #[test]
    fn std_tty_flush_is_noop() {
        StdTty::new().flush().unwrap();
    }

    #[test]
    fn empty_write_reports_zero() {
        assert_eq!(StdTty::new().write(&[]).unwrap(), 0);
    }

    #[test]
    fn scripted_replays_bytes_then_times_out() {
        let mut tty = ScriptedTty::with_input(b"ab");
        tty.push_timeout();
        tty.push_input(b"c");
        assert_eq!(tty.read_byte().unwrap(), Some(b'a'));
        assert_eq!(tty.read_byte().unwrap(), Some(b'b'));
        assert_eq!(tty.read_byte().unwrap(), None);
        assert_eq!(tty.read_byte().unwrap(), Some(b'c'));
        assert_eq!(tty.read_byte().unwrap(), None);
    }

    #[test]
    fn scripted_fails_when_drained() {
        let mut tty = ScriptedTty::with_input(b"x").fail_when_drained(io::ErrorKind::BrokenPipe);
        assert_eq!(tty.read_byte().unwrap(), Some(b'x'));
        assert_eq!(
            tty.read_byte().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn scripted_counts_writes() {
        let mut tty = ScriptedTty::new();
        tty.write_all(b"one").unwrap();
        tty.write_all(b"two").unwrap();
        assert_eq!(tty.write_count(), 2);
        assert_eq!(tty.output(), b"onetwo");

        tty.clear_output();
        assert_eq!(tty.write_count(), 0);
        assert!(tty.output().is_empty());
    }
}

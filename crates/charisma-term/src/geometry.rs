// SPDX-License-Identifier: MIT
//
// Terminal geometry — how big is the screen?
//
// Two ways to find out. The cheap one is `ioctl(TIOCGWINSZ)`. Some
// terminals (serial consoles, a few emulators, anything behind a pipe)
// either fail that ioctl or answer with zero columns, so there is a
// fallback that asks the terminal itself:
//
//   1. Shove the cursor 999 right and 999 down. The terminal clamps it
//      to the bottom-right corner.
//   2. Send DSR 6 ("where is the cursor?").
//   3. Read back `ESC [ rows ; cols R`. The corner's position *is* the size.
//
// The reply is read one byte at a time into a bounded buffer. A reply that
// never reaches `R` (read timeout, buffer full) or doesn't parse is an
// error, not a retry: a terminal that doesn't answer DSR won't start
// answering on the second attempt, and we must not hang at startup.

use std::io;

use crate::ansi::{self, EscBuf};
use crate::error::GeometryError;
use crate::terminal::{self, Size};
use crate::tty::Tty;

/// Capacity of the cursor-report buffer, terminator excluded.
const REPORT_CAP: usize = 31;

/// Determine the terminal size, falling back to the cursor probe.
///
/// # Errors
///
/// Returns a [`GeometryError`] if the ioctl is unusable and the probe fails.
pub fn window_size(tty: &mut impl Tty) -> Result<Size, GeometryError> {
    resolve(terminal::query_size(), tty)
}

/// Pick the primary answer if it is usable, otherwise run the probe.
///
/// `primary` is the result of the direct size query. An `Ok` with zero
/// columns counts as a failure.
///
/// # Errors
///
/// Returns a [`GeometryError`] if the fallback probe fails.
pub fn resolve(primary: io::Result<Size>, tty: &mut impl Tty) -> Result<Size, GeometryError> {
    match primary {
        Ok(size) if size.cols > 0 => {
            tracing::debug!(rows = size.rows, cols = size.cols, "window size from ioctl");
            return Ok(size);
        }
        Ok(_) => tracing::info!("ioctl reported zero columns; probing cursor position"),
        Err(e) => tracing::info!(error = %e, "window size ioctl failed; probing cursor position"),
    }

    ansi::cursor_to_far_corner(tty).map_err(GeometryError::ProbeWrite)?;
    tty.flush().map_err(GeometryError::ProbeWrite)?;

    let size = cursor_position(tty)?;
    tracing::debug!(rows = size.rows, cols = size.cols, "window size from cursor probe");
    Ok(size)
}

/// Ask the terminal where the cursor is and return it as `(rows, cols)`.
///
/// 1-based, as the terminal reports it — which is exactly what makes it
/// usable as a size when the cursor sits in the bottom-right corner.
///
/// # Errors
///
/// Returns a [`GeometryError`] on I/O failure or a malformed reply.
pub fn cursor_position(tty: &mut impl Tty) -> Result<Size, GeometryError> {
    ansi::request_cursor_position(tty).map_err(GeometryError::ProbeWrite)?;
    tty.flush().map_err(GeometryError::ProbeWrite)?;

    let mut report = EscBuf::<REPORT_CAP>::new();
    let mut terminated = false;

    while report.len() < report.capacity() {
        match tty.read_byte().map_err(GeometryError::ProbeRead)? {
            Some(b'R') => {
                terminated = true;
                break;
            }
            // Cannot overflow: the loop condition leaves room for one byte.
            Some(byte) => report.push(&[byte]).map_err(|_| GeometryError::Unterminated)?,
            None => break,
        }
    }

    if !terminated {
        tracing::warn!(received = ?String::from_utf8_lossy(report.as_bytes()), "cursor report not terminated");
        return Err(GeometryError::Unterminated);
    }
    parse_cursor_report(report.as_bytes())
}

/// Parse the body of a cursor position report, `R` already stripped.
///
/// Accepts exactly `ESC [ <digits> ; <digits>`. Zero in either position
/// is rejected: no real terminal has a zero-sized axis.
///
/// # Errors
///
/// [`GeometryError::MissingPrefix`] without the `ESC [` lead-in,
/// [`GeometryError::Malformed`] for anything else that doesn't fit.
pub fn parse_cursor_report(report: &[u8]) -> Result<Size, GeometryError> {
    let body = report
        .strip_prefix(b"\x1b[")
        .ok_or(GeometryError::MissingPrefix)?;

    let malformed = || GeometryError::Malformed(String::from_utf8_lossy(body).into_owned());

    let mut parts = body.split(|&b| b == b';');
    let (Some(rows), Some(cols), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let rows = parse_number(rows).ok_or_else(malformed)?;
    let cols = parse_number(cols).ok_or_else(malformed)?;
    if rows == 0 || cols == 0 {
        return Err(malformed());
    }

    Ok(Size { cols, rows })
}

/// Parse a non-empty run of ASCII digits into a `u16`.
fn parse_number(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

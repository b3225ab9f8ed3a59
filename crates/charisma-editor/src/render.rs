//! Frame composition.
//!
//! One frame = one write. Everything for a screen update is appended to an
//! [`OutputBuffer`] and handed to the terminal in a single call. The frame is
//! bracketed by hide/show cursor so the cursor doesn't visibly sweep across
//! the screen while rows are redrawn.
//!
//! Each row is `~`, except row `rows / 3` which carries the centered welcome
//! banner. Rows end with EL ("clear to end of line") instead of relying on
//! a full-screen clear: cheaper, and it still wipes whatever a previous,
//! wider frame left behind. The last row gets no `\r\n` so the terminal
//! doesn't scroll.

use std::fmt::Write as _;

use charisma_term::ansi::{self, EscBuf};
use charisma_term::output::OutputBuffer;
use charisma_term::tty::Tty;
use charisma_term::{Result, TermError};

use crate::editor::Editor;

/// Capacity of the welcome banner buffer.
pub const BANNER_CAP: usize = 80;

/// Marker drawn at the start of every row.
const ROW_MARKER: &[u8] = b"~";

/// The welcome banner text.
#[must_use]
pub fn welcome() -> EscBuf<BANNER_CAP> {
    let mut banner = EscBuf::new();
    // A version string too long for the buffer leaves the banner without it.
    let _ = write!(banner, "Charisma editor -- Version {}", env!("CARGO_PKG_VERSION"));
    banner
}

/// Draw and flush one frame for `editor` to `tty`.
///
/// # Errors
///
/// [`TermError::Write`] if the frame can't be written.
pub fn refresh_screen(editor: &Editor, tty: &mut impl Tty) -> Result<()> {
    let mut out = OutputBuffer::new();
    compose_frame(editor, &mut out);
    out.flush_to(tty).map_err(TermError::Write)
}

/// Append a whole frame to `out`.
///
/// Appends the buffer refuses are dropped; see [`OutputBuffer::append`].
pub fn compose_frame(editor: &Editor, out: &mut OutputBuffer) {
    ansi::cursor_hide(out).ok();
    ansi::cursor_home(out).ok();

    draw_rows(editor, out);

    let (cx, cy) = editor.cursor();
    ansi::cursor_to(out, cx, cy).ok();
    ansi::cursor_show(out).ok();
}

/// Append every screen row.
pub fn draw_rows(editor: &Editor, out: &mut OutputBuffer) {
    let size = editor.size();
    let banner = welcome();

    for y in 1..=size.rows {
        if y == size.rows / 3 {
            banner_row(banner.as_bytes(), size.cols, out);
        } else {
            out.append(ROW_MARKER);
        }

        ansi::clear_line(out).ok();

        if y != size.rows {
            out.append(b"\r\n");
        }
    }
}

/// Append `banner` centered in `cols` columns, truncated if it doesn't fit.
///
/// The row marker still opens the line when there is padding to spare; it
/// takes one column of the left padding.
pub fn banner_row(banner: &[u8], cols: u16, out: &mut OutputBuffer) {
    let shown = &banner[..banner.len().min(usize::from(cols))];
    let mut padding = (usize::from(cols) - shown.len()) / 2;

    if padding > 0 {
        out.append(ROW_MARKER);
        padding -= 1;
    }
    for _ in 0..padding {
        out.append(b" ");
    }
    out.append(shown);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

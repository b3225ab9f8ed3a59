// SPDX-License-Identifier: MIT
//
// charisma-term — terminal kernel for the charisma editor.
//
// Raw-mode session control, terminal geometry discovery, and batched
// output. No TUI framework underneath: direct termios via libc and
// hand-written ANSI escape sequences. Every frame leaves the process in
// exactly one write(), and every way out of raw mode short of a signal
// restores the terminal the user had.
//
// Unix only.

pub mod ansi;
pub mod error;
pub mod geometry;
pub mod input;
pub mod output;
pub mod terminal;
pub mod tty;

pub use error::{GeometryError, Result, TermError};

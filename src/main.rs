// SPDX-License-Identifier: MIT
//
// charisma — a minimal raw-mode terminal editor.
//
// This is the main binary that wires the session together:
//
//   charisma-term   → raw mode guard, geometry, output buffer, tty I/O
//   charisma-editor → session state, key dispatch, frame composition
//
// Lifecycle:
//
//   logging → raw mode on → window size → loop { draw; key } → raw mode off
//
// The raw-mode guard lives in `run`. Whatever ends the session (Ctrl-Q,
// an error bubbling up through `?`, a panic) the guard puts the terminal
// back before `main` prints anything or picks an exit code.

mod config;

use std::process;

use charisma_editor::editor::{self, Editor};
use charisma_term::ansi;
use charisma_term::geometry;
use charisma_term::terminal::{RawMode, StdinMode};
use charisma_term::tty::StdTty;
use charisma_term::TermError;

use crate::config::Config;

fn main() {
    let config = Config::from_env();
    config::init_logging(&config);

    if let Err(e) = run() {
        // The terminal is already out of raw mode here.
        let mut tty = StdTty::new();
        let _ = ansi::clear_screen(&mut tty);
        let _ = ansi::cursor_home(&mut tty);

        let message = diagnostic(&e);
        tracing::error!(error = %message, "fatal");
        eprintln!("{message}");
        process::exit(1);
    }

    tracing::info!("charisma exiting");
}

/// Run one editor session on the controlling terminal.
fn run() -> anyhow::Result<()> {
    let mut tty = StdTty::new();
    let raw = RawMode::enable(StdinMode)?;

    let size = geometry::window_size(&mut tty).map_err(TermError::from)?;
    let mut editor = Editor::new(size);
    editor::run(&mut editor, &mut tty)?;

    raw.restore()?;
    Ok(())
}

/// The one-line fatal diagnostic: `charisma: op: cause`.
fn diagnostic(e: &anyhow::Error) -> String {
    format!("charisma: {e:#}")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

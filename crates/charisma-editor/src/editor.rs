//! Session state and input dispatch.
//!
//! [`Editor`] is everything the session knows: where the cursor is and how
//! big the screen is. It is created once, after raw mode is on and the
//! geometry is known, and passed by reference to the renderer and the key
//! handler. Nothing here is global.
//!
//! The loop is the classic one: draw a frame, block for one key, act on it,
//! repeat. The only normal way out is Ctrl-Q; every error propagates to the
//! caller, which owns the raw-mode guard.

use charisma_term::ansi;
use charisma_term::input::KeyEvent;
use charisma_term::terminal::Size;
use charisma_term::tty::Tty;
use charisma_term::{Result, TermError};

use crate::render;

/// Where the cursor starts.
pub const START_CURSOR: (i32, i32) = (10, 10);

// ─── Commands ───────────────────────────────────────────────────────────────

/// One step of cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

/// What a key asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Clear the screen and end the session.
    Quit,
    /// Move the cursor one cell.
    Move(Direction),
    /// Unbound key.
    None,
}

impl Command {
    /// Map a key to a command: Ctrl-Q quits, `w`/`a`/`s`/`d` move.
    #[must_use]
    pub fn from_key(key: KeyEvent) -> Self {
        if key.is_ctrl(b'q') {
            return Self::Quit;
        }
        if !key.modifiers.is_empty() {
            return Self::None;
        }
        match key.byte {
            b'w' => Self::Move(Direction::Up),
            b'a' => Self::Move(Direction::Left),
            b's' => Self::Move(Direction::Down),
            b'd' => Self::Move(Direction::Right),
            _ => Self::None,
        }
    }
}

/// What the loop should do after a key has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the loop cleanly.
    Quit,
}

// ─── Boundary policy ────────────────────────────────────────────────────────

/// What happens when the cursor is moved past a screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// No limits. Coordinates may go negative or beyond the screen; the
    /// terminal gets whatever position results.
    #[default]
    Unbounded,
    /// Keep the cursor inside `[0, cols) × [0, rows)`.
    Clamp,
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// Session state: cursor position and screen size.
///
/// Coordinates are 0-based; the renderer converts to the terminal's
/// 1-based positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    cx: i32,
    cy: i32,
    size: Size,
    policy: BoundaryPolicy,
}

impl Editor {
    /// A fresh session on a screen of `size`, cursor at [`START_CURSOR`].
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            cx: START_CURSOR.0,
            cy: START_CURSOR.1,
            size,
            policy: BoundaryPolicy::Unbounded,
        }
    }

    /// Use `policy` for subsequent cursor moves.
    #[must_use]
    pub const fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Put the cursor at `(cx, cy)` as-is.
    #[must_use]
    pub const fn with_cursor(mut self, cx: i32, cy: i32) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    /// Cursor as `(column, row)`, 0-based.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (i32, i32) {
        (self.cx, self.cy)
    }

    /// Screen size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Move the cursor one cell in `dir`. Only one axis changes.
    pub fn move_cursor(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.cy = self.cy.saturating_sub(1),
            Direction::Left => self.cx = self.cx.saturating_sub(1),
            Direction::Down => self.cy = self.cy.saturating_add(1),
            Direction::Right => self.cx = self.cx.saturating_add(1),
        }

        if self.policy == BoundaryPolicy::Clamp {
            self.cx = self.cx.clamp(0, (i32::from(self.size.cols) - 1).max(0));
            self.cy = self.cy.clamp(0, (i32::from(self.size.rows) - 1).max(0));
        }
    }

    /// Read one key and act on it.
    ///
    /// # Errors
    ///
    /// [`TermError::Read`] if the key can't be read, [`TermError::Write`]
    /// if the exit clear can't be written.
    pub fn process_key(&mut self, tty: &mut impl Tty) -> Result<Action> {
        let key = read_key(tty)?;

        match Command::from_key(key) {
            Command::Quit => {
                clear_for_exit(tty)?;
                tracing::info!("quit requested");
                Ok(Action::Quit)
            }
            Command::Move(dir) => {
                self.move_cursor(dir);
                tracing::trace!(cx = self.cx, cy = self.cy, "cursor moved");
                Ok(Action::Continue)
            }
            Command::None => Ok(Action::Continue),
        }
    }
}

/// Block until one key arrives.
///
/// Read timeouts are the normal idle state in raw mode and are retried
/// silently.
///
/// # Errors
///
/// [`TermError::Read`] for any read failure other than "no data yet".
pub fn read_key(tty: &mut impl Tty) -> Result<KeyEvent> {
    loop {
        if let Some(byte) = tty.read_byte().map_err(TermError::Read)? {
            return Ok(KeyEvent::from_byte(byte));
        }
    }
}

/// Wipe the screen and home the cursor so the shell prompt starts clean.
fn clear_for_exit(tty: &mut impl Tty) -> Result<()> {
    ansi::clear_screen(tty).map_err(TermError::Write)?;
    ansi::cursor_home(tty).map_err(TermError::Write)?;
    tty.flush().map_err(TermError::Write)
}

/// Run the session: draw, read, act, until Ctrl-Q.
///
/// # Errors
///
/// Any [`TermError`] from rendering or input; the loop stops at the first.
pub fn run(editor: &mut Editor, tty: &mut impl Tty) -> Result<()> {
    tracing::info!(
        rows = editor.size.rows,
        cols = editor.size.cols,
        "session started"
    );
    loop {
        render::refresh_screen(editor, tty)?;
        if editor.process_key(tty)? == Action::Quit {
            return Ok(());
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr) and ioctl (TIOCGWINSZ). These are the standard POSIX
// interfaces for terminal control — there is no safe alternative. Each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// `RawMode` is a guard. Enabling it captures the terminal attributes in
// effect right now, before anything is changed, and applies raw mode.
// From then on there is exactly one way out of the session scope that
// doesn't restore those attributes: the process being killed by a signal.
// Explicit `restore()` reports failure; `Drop` covers early returns, `?`
// propagation and unwinding; the panic hook covers panics that abort
// before unwinding reaches the guard.
//
// Raw mode here means: no echo, no line buffering, no signal keys (Ctrl-C
// and Ctrl-Z arrive as bytes), no CR→NL or output post-processing, 8-bit
// characters, and reads that return after at most 100ms even with no input.

use std::io;
use std::sync::{Mutex, Once};

use crate::error::{Result, TermError};
use crate::tty;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// The raw answer is returned even if it is degenerate (zero columns);
/// deciding whether to trust it is the geometry resolver's job.
///
/// # Errors
///
/// Returns the OS error if the ioctl fails (e.g., stdout is not a terminal).
pub fn query_size() -> io::Result<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

// ─── Attribute Access ───────────────────────────────────────────────────────

/// Read and write terminal attributes.
///
/// The seam between the raw-mode guard and the OS. [`StdinMode`] is the
/// real thing; tests substitute a recorder.
pub trait ModeControl {
    /// Read the current attributes.
    ///
    /// # Errors
    ///
    /// Returns the OS error from `tcgetattr`.
    fn get_attributes(&mut self) -> io::Result<libc::termios>;

    /// Apply `attrs`, discarding unread input first.
    ///
    /// # Errors
    ///
    /// Returns the OS error from `tcsetattr`.
    fn set_attributes(&mut self, attrs: &libc::termios) -> io::Result<()>;

    /// Whether there is a terminal behind these attributes at all.
    fn is_terminal(&self) -> bool {
        true
    }

    /// Whether these attributes belong to the process's own terminal, so
    /// the panic hook should restore them too.
    fn is_controlling_terminal(&self) -> bool {
        false
    }
}

/// Attributes of the terminal on stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinMode;

impl ModeControl for StdinMode {
    fn get_attributes(&mut self) -> io::Result<libc::termios> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(termios)
    }

    fn set_attributes(&mut self, attrs: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, attrs) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        tty::is_tty()
    }

    fn is_controlling_terminal(&self) -> bool {
        true
    }
}

/// Derive raw-mode attributes from `original`.
///
/// Only the listed flags change; everything else (baud rate, other control
/// characters) is carried over.
#[must_use]
pub fn make_raw(original: &libc::termios) -> libc::termios {
    let mut raw = *original;

    // Input: no Ctrl-S/Ctrl-Q flow control, no CR→NL, no SIGINT on break,
    // no parity check, no 8th-bit stripping.
    raw.c_iflag &= !(libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP);
    // Output: no "\n" → "\r\n" post-processing.
    raw.c_oflag &= !libc::OPOST;
    raw.c_cflag |= libc::CS8;
    // Local: no echo, byte-at-a-time input, no Ctrl-V, no signal keys.
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

    // VMIN=0, VTIME=1: read() returns as soon as a byte is available, or
    // with nothing after 100ms.
    raw.c_cc[libc::VMIN] = 0;
    raw.c_cc[libc::VTIME] = 1;

    raw
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore raw mode without the guard.
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Restore termios from the global backup. Best-effort, ignores errors.
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Sequence written on panic: show the cursor in case a frame was mid-draw.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h";

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            unsafe {
                let _ = libc::write(
                    libc::STDOUT_FILENO,
                    EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                    EMERGENCY_RESTORE.len(),
                );
            }
            restore_termios_from_backup();
            original(info);
        }));
    });
}

fn set_backup(value: Option<libc::termios>) {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        *guard = value;
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode guard.
///
/// Holds the attributes captured at [`enable`](Self::enable) time and puts
/// them back when [`restore`](Self::restore)d or dropped.
///
/// # Example
///
/// ```no_run
/// use charisma_term::terminal::{RawMode, StdinMode};
///
/// let raw = RawMode::enable(StdinMode)?;
/// // ... draw, read keys ...
/// raw.restore()?;
/// # Ok::<(), charisma_term::TermError>(())
/// ```
pub struct RawMode<C: ModeControl = StdinMode> {
    control: C,
    original: libc::termios,
    restored: bool,
}

impl<C: ModeControl> RawMode<C> {
    /// Capture the current attributes and switch to raw mode.
    ///
    /// # Errors
    ///
    /// [`TermError::NotATerminal`] if there is no terminal to put in raw
    /// mode, [`TermError::GetAttributes`] if the attributes can't be read,
    /// [`TermError::SetAttributes`] if raw mode can't be
    /// applied. Nothing has been changed in the first case; in the second,
    /// the original attributes are still in effect as far as we can tell.
    pub fn enable(mut control: C) -> Result<Self> {
        if !control.is_terminal() {
            return Err(TermError::NotATerminal);
        }

        let original = control
            .get_attributes()
            .map_err(TermError::GetAttributes)?;

        if control.is_controlling_terminal() {
            install_panic_hook();
            set_backup(Some(original));
        }

        // From here on the guard exists, so any failure below restores.
        let mut guard = Self {
            control,
            original,
            restored: false,
        };

        let raw = make_raw(&guard.original);
        guard
            .control
            .set_attributes(&raw)
            .map_err(TermError::SetAttributes)?;

        tracing::debug!("raw mode enabled");
        Ok(guard)
    }

    /// Put the original attributes back.
    ///
    /// # Errors
    ///
    /// [`TermError::SetAttributes`] if `tcsetattr` fails. The guard is
    /// consumed either way; its drop does not retry.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.apply_original().map_err(TermError::SetAttributes)
    }

    fn apply_original(&mut self) -> io::Result<()> {
        let original = self.original;
        self.control.set_attributes(&original)?;
        if self.control.is_controlling_terminal() {
            set_backup(None);
        }
        tracing::debug!("terminal attributes restored");
        Ok(())
    }
}

impl<C: ModeControl> Drop for RawMode<C> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.apply_original() {
            tracing::error!(error = %e, "failed to restore terminal attributes");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared log of every attribute set applied through a `Recorder`.
    type Applied = Rc<RefCell<Vec<libc::termios>>>;

    /// A `ModeControl` that hands out fixed attributes and records sets.
    struct Recorder {
        current: libc::termios,
        applied: Applied,
        terminal: bool,
        fail_get: bool,
        /// Fail the n-th set call (0-based).
        fail_set_at: Option<usize>,
    }

    impl Recorder {
        fn new(applied: &Applied) -> Self {
            Self {
                current: sample_termios(),
                applied: Rc::clone(applied),
                terminal: true,
                fail_get: false,
                fail_set_at: None,
            }
        }
    }

    impl ModeControl for Recorder {
        fn is_terminal(&self) -> bool {
            self.terminal
        }

        fn get_attributes(&mut self) -> io::Result<libc::termios> {
            if self.fail_get {
                return Err(io::Error::from_raw_os_error(libc::ENOTTY));
            }
            Ok(self.current)
        }

        fn set_attributes(&mut self, attrs: &libc::termios) -> io::Result<()> {
            let n = self.applied.borrow().len();
            if self.fail_set_at == Some(n) {
                self.applied.borrow_mut().push(self.current);
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            self.current = *attrs;
            self.applied.borrow_mut().push(*attrs);
            Ok(())
        }
    }

    /// A cooked-mode termios as a shell would leave it.
    fn sample_termios() -> libc::termios {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_iflag = libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP;
        t.c_oflag = libc::OPOST;
        t.c_cflag = libc::CREAD;
        t.c_lflag = libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG | libc::ECHOE;
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        t.c_cc[libc::VINTR] = 3;
        t
    }

    fn same(a: &libc::termios, b: &libc::termios) -> bool {
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }

    // ── make_raw ────────────────────────────────────────────────────

    #[test]
    fn make_raw_clears_input_flags() {
        let raw = make_raw(&sample_termios());
        for flag in [libc::IXON, libc::ICRNL, libc::BRKINT, libc::INPCK, libc::ISTRIP] {
            assert_eq!(raw.c_iflag & flag, 0);
        }
    }

    #[test]
    fn make_raw_clears_output_processing() {
        let raw = make_raw(&sample_termios());
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
    }

    #[test]
    fn make_raw_clears_local_flags() {
        let raw = make_raw(&sample_termios());
        for flag in [libc::ECHO, libc::ICANON, libc::IEXTEN, libc::ISIG] {
            assert_eq!(raw.c_lflag & flag, 0);
        }
    }

    #[test]
    fn make_raw_keeps_unrelated_flags() {
        let raw = make_raw(&sample_termios());
        assert_ne!(raw.c_lflag & libc::ECHOE, 0);
        assert_ne!(raw.c_cflag & libc::CREAD, 0);
        assert_eq!(raw.c_cc[libc::VINTR], 3);
    }

    #[test]
    fn make_raw_sets_eight_bit_chars() {
        let raw = make_raw(&sample_termios());
        assert_eq!(raw.c_cflag & libc::CS8, libc::CS8);
    }

    #[test]
    fn make_raw_sets_read_timeout() {
        let raw = make_raw(&sample_termios());
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);
    }

    // ── RawMode ─────────────────────────────────────────────────────

    #[test]
    fn enable_applies_raw_attributes() {
        let applied = Applied::default();
        let guard = RawMode::enable(Recorder::new(&applied)).unwrap();
        assert_eq!(applied.borrow().len(), 1);
        assert!(same(&applied.borrow()[0], &make_raw(&sample_termios())));
        guard.restore().unwrap();
    }

    #[test]
    fn original_is_captured_before_mutation() {
        let applied = Applied::default();
        let guard = RawMode::enable(Recorder::new(&applied)).unwrap();
        guard.restore().unwrap();

        // The recorder's current attributes were raw by the time of the
        // restore, so only a pre-mutation capture puts cooked ones back.
        let applied = applied.borrow();
        assert!(same(&applied[0], &make_raw(&sample_termios())));
        assert!(same(&applied[1], &sample_termios()));
    }

    #[test]
    fn explicit_restore_reapplies_original() {
        let applied = Applied::default();
        let guard = RawMode::enable(Recorder::new(&applied)).unwrap();
        guard.restore().unwrap();

        let applied = applied.borrow();
        assert_eq!(applied.len(), 2);
        assert!(same(applied.last().unwrap(), &sample_termios()));
    }

    #[test]
    fn drop_restores_original() {
        let applied = Applied::default();
        {
            let _guard = RawMode::enable(Recorder::new(&applied)).unwrap();
        }
        let applied = applied.borrow();
        assert!(same(applied.last().unwrap(), &sample_termios()));
    }

    #[test]
    fn error_path_restores_original() {
        fn session(applied: &Applied) -> Result<()> {
            let _guard = RawMode::enable(Recorder::new(applied))?;
            Err(TermError::Read(io::Error::from(io::ErrorKind::BrokenPipe)))
        }

        let applied = Applied::default();
        assert!(session(&applied).is_err());
        assert!(same(applied.borrow().last().unwrap(), &sample_termios()));
    }

    #[test]
    fn unwinding_restores_original() {
        let applied = Applied::default();
        let inner = Rc::clone(&applied);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = RawMode::enable(Recorder::new(&inner)).unwrap();
            panic!("mid-frame");
        }));
        assert!(result.is_err());
        assert!(same(applied.borrow().last().unwrap(), &sample_termios()));
    }

    #[test]
    fn restore_is_not_repeated_on_drop() {
        let applied = Applied::default();
        let guard = RawMode::enable(Recorder::new(&applied)).unwrap();
        guard.restore().unwrap();
        assert_eq!(applied.borrow().len(), 2);
    }

    #[test]
    fn get_failure_is_get_attributes_error() {
        let applied = Applied::default();
        let mut control = Recorder::new(&applied);
        control.fail_get = true;

        let err = RawMode::enable(control).err().unwrap();
        assert!(matches!(err, TermError::GetAttributes(_)));
        assert!(err.to_string().starts_with("tcgetattr"));
        assert!(applied.borrow().is_empty(), "nothing may be changed");
    }

    #[test]
    fn refuses_to_start_without_a_terminal() {
        let applied = Applied::default();
        let mut control = Recorder::new(&applied);
        control.terminal = false;
        control.fail_get = true;

        let err = RawMode::enable(control).err().unwrap();
        assert!(matches!(err, TermError::NotATerminal));
        assert_eq!(err.to_string(), "stdin is not a terminal");
        assert!(applied.borrow().is_empty(), "nothing may be changed");
    }

    #[test]
    fn set_failure_is_set_attributes_error_and_restores() {
        let applied = Applied::default();
        let mut control = Recorder::new(&applied);
        control.fail_set_at = Some(0);

        let err = RawMode::enable(control).err().unwrap();
        assert!(matches!(err, TermError::SetAttributes(_)));
        assert!(err.to_string().starts_with("tcsetattr"));
        assert!(same(applied.borrow().last().unwrap(), &sample_termios()));
    }

    #[test]
    fn restore_failure_is_reported() {
        let applied = Applied::default();
        let mut control = Recorder::new(&applied);
        control.fail_set_at = Some(1);

        let guard = RawMode::enable(control).unwrap();
        let err = guard.restore().unwrap_err();
        assert!(matches!(err, TermError::SetAttributes(_)));
    }

    // ── Terminal queries ────────────────────────────────────────────

    #[test]
    fn query_size_does_not_panic() {
        let _ = query_size();
    }

    #[test]
    fn emergency_restore_shows_cursor() {
        assert_eq!(EMERGENCY_RESTORE, b"\x1b[?25h");
    }
}

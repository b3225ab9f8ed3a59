// SPDX-License-Identifier: MIT
//
// Error types for terminal control.
//
// Everything that can go wrong here means the terminal environment itself
// is unusable, so callers treat every `TermError` as fatal. The display
// strings name the failing operation (`tcgetattr`, `read`, ...) and nothing
// else: the cause is carried as the error source, and the top-level
// diagnostic prints the whole chain as `op: cause`.

use std::io;

use thiserror::Error;

/// A fatal terminal failure.
#[derive(Error, Debug)]
pub enum TermError {
    /// Stdin is not a terminal; raw mode makes no sense.
    #[error("stdin is not a terminal")]
    NotATerminal,

    #[error("tcgetattr")]
    GetAttributes(#[source] io::Error),

    #[error("tcsetattr")]
    SetAttributes(#[source] io::Error),

    #[error("get window size")]
    WindowSize(#[from] GeometryError),

    #[error("read")]
    Read(#[source] io::Error),

    #[error("write")]
    Write(#[source] io::Error),
}

/// Why the terminal dimensions could not be determined.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("cursor probe write failed")]
    ProbeWrite(#[source] io::Error),

    #[error("cursor probe read failed")]
    ProbeRead(#[source] io::Error),

    /// The response ended (timeout or full buffer) before `R` arrived.
    #[error("cursor position report not terminated")]
    Unterminated,

    /// The response did not start with `ESC [`.
    #[error("cursor position report has no CSI prefix")]
    MissingPrefix,

    /// The body between the prefix and `R` was not `<rows>;<cols>`.
    #[error("malformed cursor position report: {0:?}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, TermError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn display_names_only_the_failing_operation() {
        let err = TermError::GetAttributes(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "tcgetattr");

        let err = TermError::SetAttributes(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "tcsetattr");

        let err = TermError::Read(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.to_string(), "read");

        let err = TermError::Write(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.to_string(), "write");
    }

    #[test]
    fn cause_is_the_source() {
        let err = TermError::Read(io::Error::from_raw_os_error(libc::EIO));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), io::Error::from_raw_os_error(libc::EIO).to_string());
    }

    #[test]
    fn geometry_error_converts_into_window_size() {
        let err: TermError = GeometryError::Unterminated.into();
        assert_eq!(err.to_string(), "get window size");
        assert_eq!(
            err.source().unwrap().to_string(),
            "cursor position report not terminated"
        );
    }

    #[test]
    fn cursor_report_io_errors_chain_to_the_os_error() {
        let err = GeometryError::ProbeRead(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.to_string(), "cursor probe read failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn malformed_report_shows_body() {
        let err = GeometryError::Malformed("24x80".into());
        assert_eq!(err.to_string(), "malformed cursor position report: \"24x80\"");
        assert!(err.source().is_none());
    }
}

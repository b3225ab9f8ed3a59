// SPDX-License-Identifier: MIT
//
// Runtime configuration and diagnostic logging.
//
// The editor itself has nothing to configure. What can be set is where
// diagnostics go: the terminal is in raw mode and fully owned by the
// renderer, so log output must never reach it. Logging is off unless a
// log file is named.
//
//   CHARISMA_LOG=/tmp/charisma.log        enable, append to this file
//   CHARISMA_LOG_LEVEL=debug               EnvFilter directive (default: info)

use std::env;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable naming the log file.
pub const LOG_FILE_VAR: &str = "CHARISMA_LOG";

/// Environment variable holding the log filter directive.
pub const LOG_LEVEL_VAR: &str = "CHARISMA_LOG_LEVEL";

const DEFAULT_FILTER: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Append diagnostics to this file. `None` disables logging.
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directive, e.g. `info` or `charisma_term=debug`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: None,
            log_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::var_os(LOG_FILE_VAR), env::var(LOG_LEVEL_VAR).ok())
    }

    /// Build from raw variable values. Empty values count as unset.
    #[must_use]
    pub fn from_vars(log_file: Option<OsString>, log_filter: Option<String>) -> Self {
        Self {
            log_file: log_file.filter(|p| !p.is_empty()).map(PathBuf::from),
            log_filter: log_filter
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        }
    }

    /// The parsed filter, falling back to the default on a bad directive.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global tracing subscriber if a log file is configured.
///
/// Must run before raw mode: a log file that can't be opened is reported
/// on stderr, which is still a normal cooked terminal at that point.
pub fn init_logging(config: &Config) {
    let Some(path) = &config.log_file else {
        return;
    };

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("charisma: {}: {e}; logging disabled", path.display());
            return;
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(config.filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "charisma starting");
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unset_means_no_logging() {
        assert_eq!(Config::from_vars(None, None), Config::default());
    }

    #[test]
    fn log_file_is_taken_verbatim() {
        let config = Config::from_vars(Some("/tmp/charisma.log".into()), None);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/charisma.log")));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = Config::from_vars(Some(OsString::new()), Some("  ".into()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn filter_directive_is_trimmed() {
        let config = Config::from_vars(None, Some(" charisma_term=debug ".into()));
        assert_eq!(config.log_filter, "charisma_term=debug");
    }

    #[test]
    fn filter_builds_from_directive() {
        let config = Config::from_vars(None, Some("charisma=trace,warn".into()));
        let _ = config.filter();
    }

    #[test]
    fn init_without_file_is_noop() {
        init_logging(&Config::default());
    }
}

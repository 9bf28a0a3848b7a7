//! Error types shared across the server and the batch jobs.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Start-up configuration errors. Any of these aborts the process before a
/// socket is bound.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Root directory '{}' is not usable: {source}", path.display())]
    RootDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid log level '{0}' (expected error, warn, info or debug)")]
    InvalidLogLevel(String),
}

/// Failures while producing a response for a resolved target.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// Classify an I/O error raised while opening or inspecting `path`.
    ///
    /// `InvalidInput` means the OS rejected the name itself, which only a
    /// client can cause.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidInput => Self::NotFound(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised by the offline batch jobs. Each is fatal for the run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex_automata::meta::BuildError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

//! Log writer module
//!
//! Two output streams, access and error, each going to a file or to the
//! matching standard stream. Targets and level are fixed once at start-up.

use super::LogLevel;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Which of the two logs a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Access entries and informational lines
    Access,
    /// Warnings and errors
    Error,
}

enum LogTarget {
    Stdout,
    Stderr,
    /// Error lines written here get a timestamp, since no terminal shows when they happened
    File { file: Mutex<File>, stamp: bool },
}

impl LogTarget {
    fn open(path: Option<&str>, stream: Stream) -> io::Result<Self> {
        Ok(match (path, stream) {
            (Some(path), _) => Self::File {
                file: Mutex::new(open_log_file(path)?),
                stamp: stream == Stream::Error,
            },
            (None, Stream::Access) => Self::Stdout,
            (None, Stream::Error) => Self::Stderr,
        })
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File { file, stamp } => {
                let Ok(mut f) = file.lock() else {
                    return;
                };
                let _ = if *stamp {
                    writeln!(f, "{} {message}", Local::now().format("%Y-%m-%dT%H:%M:%S%:z"))
                } else {
                    writeln!(f, "{message}")
                };
            }
        }
    }
}

pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
    level: LogLevel,
}

impl LogWriter {
    fn new(
        level: LogLevel,
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
    ) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, Stream::Access)?,
            error: LogTarget::open(error_log_file, Stream::Error)?,
            level,
        })
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    pub fn write(&self, stream: Stream, message: &str) {
        match stream {
            Stream::Access => self.access.write_line(message),
            Stream::Error => self.error.write_line(message),
        }
    }
}

/// Open or create a log file for appending, creating parent directories
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global writer. Fails if log files cannot be opened or a
/// writer is already installed.
pub fn init(
    level: LogLevel,
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
) -> io::Result<()> {
    let writer = LogWriter::new(level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global writer, if `init()` has been called
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

/// Write through the global writer, or straight to stdout/stderr before `init()`
pub fn write(stream: Stream, message: &str) {
    match (get(), stream) {
        (Some(w), _) => w.write(stream, message),
        (None, Stream::Access) => println!("{message}"),
        (None, Stream::Error) => eprintln!("{message}"),
    }
}

// Configuration types module
// Raw (deserialized) settings and the validated, immutable server configuration

use crate::cors::CorsPolicy;
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DIR: &str = ".";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "common";

/// Main configuration structure, as read from defaults, file, env and CLI
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Listening address and what to serve
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Resolution root; `data/` and `parts/` live directly below it
    pub dir: String,
    /// Omitted or empty disables CORS, `*` allows any origin
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dir: DEFAULT_DIR.to_string(),
            cors_origin: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common, combined or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    DEFAULT_ACCESS_LOG_FORMAT.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PerformanceConfig {
    /// Tokio worker threads (defaults to the number of CPU cores)
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    /// Seconds allowed for a client to send the request head; 0 disables
    #[serde(default)]
    pub header_read_timeout: u64,
    /// Connections above this count are dropped on accept
    #[serde(default)]
    pub max_connections: Option<u64>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_keep_alive() -> bool {
    true
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            workers: None,
            keep_alive: default_keep_alive(),
            header_read_timeout: 0,
            max_connections: None,
        }
    }
}

/// Validated logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub access_log: bool,
    pub access_log_format: String,
    pub access_log_file: Option<String>,
    pub error_log_file: Option<String>,
}

/// Process-wide server configuration.
///
/// Built once before the listener is bound and never mutated afterwards;
/// every connection task reads it through a shared `Arc`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `host:port` resolved to a socket address
    pub addr: SocketAddr,
    /// Absolute, canonical resolution root
    pub root_dir: PathBuf,
    pub cors: CorsPolicy,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

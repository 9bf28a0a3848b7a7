// Configuration module entry point
// Layers defaults, config file, environment and CLI flags, then validates the
// result into the immutable `ServerConfig`

mod cli;
mod state;
mod types;

use crate::cors::CorsPolicy;
use crate::error::ConfigError;
use crate::logger::LogLevel;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

// Re-export public types
pub use cli::Cli;
pub use state::AppState;
pub use types::{
    Config, LoggingConfig, LoggingSettings, PerformanceConfig, ServerConfig, ServerSettings,
    DEFAULT_ACCESS_LOG_FORMAT, DEFAULT_DIR, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT,
};

/// Environment variable prefix, e.g. `TRANSIENT_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "TRANSIENT";

impl Config {
    /// Load configuration with CLI flags taking precedence over the
    /// environment, which takes precedence over the config file.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.dir", DEFAULT_DIR)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 0)?;

        if !cli.config.is_empty() {
            builder = builder.add_source(config::File::with_name(&cli.config).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", cli.host.clone())?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.dir", cli.dir.clone())?
            .set_override_option("server.cors_origin", cli.cors_origin.clone())?
            .set_override_option(
                "performance.workers",
                cli.workers.and_then(|w| i64::try_from(w).ok()),
            )?
            .set_override_option("logging.level", cli.log_level.clone())?
            .set_override_option("logging.access_log", cli.no_access_log.then_some(false))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl ServerConfig {
    /// Parse CLI flags and the layered sources into a validated configuration.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_config(Config::load(cli)?)
    }

    /// Validate raw settings. Fails fast on anything that would prevent the
    /// server from binding or serving.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let Config {
            server,
            logging,
            performance,
        } = config;

        let addr = resolve_addr(&server.host, server.port)?;
        let root_dir = canonical_root(&server.dir)?;
        let level = logging
            .level
            .parse::<LogLevel>()
            .map_err(ConfigError::InvalidLogLevel)?;

        Ok(Self {
            cors: CorsPolicy::from_origin_arg(server.cors_origin.as_deref()),
            host: server.host,
            port: server.port,
            addr,
            root_dir,
            logging: LoggingConfig {
                level,
                access_log: logging.access_log,
                access_log_format: logging.access_log_format,
                access_log_file: logging.access_log_file,
                error_log_file: logging.error_log_file,
            },
            performance,
        })
    }
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        addr: format!("{host}:{port}"),
        reason,
    };

    if host.is_empty() {
        return Err(invalid("empty host".to_string()));
    }
    (host, port)
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
}

fn canonical_root(dir: &str) -> Result<std::path::PathBuf, ConfigError> {
    let path = Path::new(dir);
    let root = path
        .canonicalize()
        .map_err(|source| ConfigError::RootDirectory {
            path: path.to_path_buf(),
            source,
        })?;
    if !root.is_dir() {
        return Err(ConfigError::NotADirectory(root));
    }
    Ok(root)
}

// Application state module
// Everything a connection task needs, shared read-only behind an `Arc`

use std::sync::atomic::AtomicUsize;

use super::types::ServerConfig;
use crate::routing::PathResolver;

/// Application state
pub struct AppState {
    pub config: ServerConfig,
    pub resolver: PathResolver,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    /// Create `AppState` with the built-in `data`/`parts` resolution chain
    pub fn new(config: ServerConfig) -> Self {
        let resolver = PathResolver::builtin(config.root_dir.clone());
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: ServerConfig, resolver: PathResolver) -> Self {
        Self {
            config,
            resolver,
            active_connections: AtomicUsize::new(0),
        }
    }
}

//! Shared helpers for the server integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use transient_serve::config::{AppState, LoggingConfig, PerformanceConfig, ServerConfig};
use transient_serve::cors::CorsPolicy;
use transient_serve::logger::LogLevel;
use transient_serve::server;

pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    pub shutdown: Arc<Notify>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

/// Root with `data/` and `parts/` populated with small fixtures
pub fn fixture_root() -> TempDir {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("data")).unwrap();
    std::fs::create_dir_all(root.path().join("parts")).unwrap();
    std::fs::write(root.path().join("data/tile1.fgb"), b"data-tile-one").unwrap();
    std::fs::write(root.path().join("parts/0.fgb"), b"part-zero").unwrap();
    root
}

fn config_for(root: &Path, cors: CorsPolicy) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        addr: "127.0.0.1:0".parse().unwrap(),
        root_dir: root.canonicalize().unwrap(),
        cors,
        logging: LoggingConfig {
            level: LogLevel::Error,
            access_log: false,
            access_log_format: "common".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig::default(),
    }
}

/// Bind an ephemeral port and run the accept loop on a background task
pub fn start_server(root: TempDir, cors: CorsPolicy) -> TestServer {
    let config = config_for(root.path(), cors);
    let listener = server::create_reusable_listener(config.addr).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Notify::new());
    let state = Arc::new(AppState::new(config));

    tokio::spawn(server::serve(listener, state, Arc::clone(&shutdown)));

    TestServer {
        addr,
        root,
        shutdown,
    }
}

/// Send a raw HTTP/1.1 request and read the whole response (`Connection: close`)
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

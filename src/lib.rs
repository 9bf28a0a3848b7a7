//! Static file server for the `data/` and `parts/` tile trees.
//!
//! Requests are mapped onto one of the two trees either by `Host` header
//! (`data.<domain>`, `parts.<domain>`) or by URL prefix (`/data`, `/parts`),
//! decorated with the configured CORS policy, and streamed from disk in a way
//! that tolerates clients hanging up mid-download.
//!
//! The `batch` module holds the two offline jobs that accompany the server:
//! the download manifest generator and the tile-overflow log scanner.

pub mod batch;
pub mod config;
pub mod cors;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod transfer;

//! End-to-end tests against a server bound to an ephemeral port.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use transient_serve::cors::CorsPolicy;

mod common;

use common::{fixture_root, raw_request, start_server};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_data_host_serves_file() {
    let server = start_server(fixture_root(), CorsPolicy::Disabled);

    let response = raw_request(
        server.addr,
        "GET /tile1.fgb HTTP/1.1\r\nHost: data.transient.optgeo.org\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("data-tile-one"));

    let response = raw_request(
        server.addr,
        "GET /missing.fgb HTTP/1.1\r\nHost: data.transient.optgeo.org:8000\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
}

#[tokio::test]
async fn test_prefix_route() {
    let server = start_server(fixture_root(), CorsPolicy::Disabled);
    let res = client()
        .get(server.url("/parts/0.fgb"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("access-control-allow-origin").is_none());
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"part-zero");
}

#[tokio::test]
async fn test_options_preflight_with_wildcard() {
    let server = start_server(fixture_root(), CorsPolicy::Wildcard);
    let res = client()
        .request(reqwest::Method::OPTIONS, server.url("/parts/0.fgb"))
        .header("Origin", "https://viewer.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-allow-methods"],
        "GET, OPTIONS"
    );
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_specific_origin() {
    let server = start_server(
        fixture_root(),
        CorsPolicy::SpecificOrigin("https://transient.optgeo.org".to_string()),
    );

    let res = client()
        .get(server.url("/data/tile1.fgb"))
        .header("Origin", "https://transient.optgeo.org")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://transient.optgeo.org"
    );

    let res = client()
        .get(server.url("/data/tile1.fgb"))
        .header("Origin", "https://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_range_request() {
    let server = start_server(fixture_root(), CorsPolicy::Wildcard);
    let res = client()
        .get(server.url("/data/tile1.fgb"))
        .header("Range", "bytes=5-8")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 206);
    assert_eq!(res.headers()["content-range"], "bytes 5-8/13");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"tile");
}

#[tokio::test]
async fn test_directory_redirect() {
    let server = start_server(fixture_root(), CorsPolicy::Disabled);
    let res = client().get(server.url("/data")).send().await.unwrap();
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "/data/");

    let res = client().get(server.url("/data/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("tile1.fgb"));
}

#[tokio::test]
async fn test_traversal_blocked() {
    let server = start_server(fixture_root(), CorsPolicy::Disabled);
    std::fs::write(server.root.path().join("secret.txt"), b"nope").unwrap();

    let response = raw_request(
        server.addr,
        "GET /data/../secret.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
}

#[tokio::test]
async fn test_peer_abort_does_not_disturb_server() {
    let server = start_server(fixture_root(), CorsPolicy::Disabled);
    let big = vec![7_u8; 8 * 1024 * 1024];
    std::fs::write(server.root.path().join("parts/big.fgb"), &big).unwrap();

    // Read a little of a large download, then hang up
    {
        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        stream
            .write_all(b"GET /parts/big.fgb HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = vec![0_u8; 16 * 1024];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;

    let res = client()
        .get(server.url("/parts/big.fgb"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.bytes().await.unwrap().len(), big.len());
}

#[tokio::test]
async fn test_unsupported_method() {
    let server = start_server(fixture_root(), CorsPolicy::Wildcard);
    let res = client()
        .delete(server.url("/parts/0.fgb"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 501);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

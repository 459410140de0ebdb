//! End-to-end tests against a real listener with real `WebSocket` clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use extdev_core::{Extension, StaticExtensionProvider, StatusUpdate};
use extdev_server::{DevServer, ServerConfig, ServerError};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

struct TestServer {
    server: DevServer,
    addr: SocketAddr,
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    fn ws_url(&self) -> String {
        format!("ws://{}/extensions/", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Boot a server on an auto-assigned port.
async fn boot_server(extensions: Vec<Extension>) -> TestServer {
    let provider = Arc::new(StaticExtensionProvider::new(extensions, "1.0"));
    let config = ServerConfig {
        port: 0,
        shutdown_timeout_ms: 2000,
        ..ServerConfig::default()
    };
    let server = DevServer::new(config, provider);
    let cancel = CancellationToken::new();
    let (addr, handle) = server.listen(cancel.clone()).await.unwrap();
    TestServer {
        server,
        addr,
        cancel,
        handle,
    }
}

async fn connect(url: &str) -> WsStream {
    let (ws, _) = timeout(TIMEOUT, connect_async(url)).await.unwrap().unwrap();
    ws
}

/// Next text frame, parsed as JSON.
async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Poll until the registry holds `expected` connections.
async fn wait_for_connections(server: &DevServer, expected: usize) {
    timeout(TIMEOUT, async {
        while server.registry().len() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} connections, registry has {}",
            server.registry().len()
        )
    });
}

fn uuids(message: &Value) -> Vec<&str> {
    message["extensions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["uuid"].as_str().unwrap())
        .collect()
}

// ── Push channel ──

#[tokio::test]
async fn connected_is_the_first_message() {
    let ts = boot_server(vec![Extension::new("a"), Extension::new("b")]).await;
    let mut ws = connect(&ts.ws_url()).await;

    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "connected");
    assert_eq!(uuids(&first), ["a", "b"]);
}

#[tokio::test]
async fn broadcasts_arrive_in_order_at_every_client() {
    let ts = boot_server(vec![Extension::new("a")]).await;
    let mut c1 = connect(&ts.ws_url()).await;
    let mut c2 = connect(&ts.ws_url()).await;
    wait_for_connections(&ts.server, 2).await;

    let broadcaster = ts.server.broadcaster();
    assert_eq!(broadcaster.notify(StatusUpdate::new("first", Vec::new())), 2);
    assert_eq!(broadcaster.notify(StatusUpdate::new("second", Vec::new())), 2);

    for ws in [&mut c1, &mut c2] {
        assert_eq!(next_json(ws).await["type"], "connected");
        assert_eq!(next_json(ws).await["type"], "first");
        assert_eq!(next_json(ws).await["type"], "second");
    }
}

#[tokio::test]
async fn update_payload_carries_extensions() {
    let ts = boot_server(vec![Extension::new("a")]).await;
    let mut ws = connect(&ts.ws_url()).await;
    let _ = next_json(&mut ws).await;
    wait_for_connections(&ts.server, 1).await;

    let _ = ts
        .server
        .broadcaster()
        .notify(StatusUpdate::new("update", vec![Extension::new("x")]));
    let msg = next_json(&mut ws).await;
    assert_eq!(msg["type"], "update");
    assert_eq!(uuids(&msg), ["x"]);
}

#[tokio::test]
async fn client_close_unregisters_connection() {
    let ts = boot_server(Vec::new()).await;
    let mut ws = connect(&ts.ws_url()).await;
    wait_for_connections(&ts.server, 1).await;

    ws.close(None).await.unwrap();
    wait_for_connections(&ts.server, 0).await;
    assert_eq!(
        ts.server
            .broadcaster()
            .notify(StatusUpdate::new("update", Vec::new())),
        0
    );
}

#[tokio::test]
async fn dropped_client_is_unregistered() {
    let ts = boot_server(Vec::new()).await;
    let ws = connect(&ts.ws_url()).await;
    wait_for_connections(&ts.server, 1).await;

    drop(ws);
    wait_for_connections(&ts.server, 0).await;
}

#[tokio::test]
async fn client_payloads_are_ignored() {
    let ts = boot_server(Vec::new()).await;
    let mut ws = connect(&ts.ws_url()).await;
    let _ = next_json(&mut ws).await;
    wait_for_connections(&ts.server, 1).await;

    ws.send(Message::Text("hello".into())).await.unwrap();
    let _ = ts
        .server
        .broadcaster()
        .notify(StatusUpdate::new("update", Vec::new()));
    assert_eq!(next_json(&mut ws).await["type"], "update");
    assert_eq!(ts.server.registry().len(), 1);
}

// ── Lifecycle ──

#[tokio::test]
async fn cancellation_closes_every_client() {
    let ts = boot_server(Vec::new()).await;
    let mut c1 = connect(&ts.ws_url()).await;
    let mut c2 = connect(&ts.ws_url()).await;
    wait_for_connections(&ts.server, 2).await;

    ts.cancel.cancel();
    timeout(TIMEOUT, ts.handle).await.unwrap().unwrap().unwrap();
    assert!(ts.server.registry().is_empty());

    for ws in [&mut c1, &mut c2] {
        let close = timeout(TIMEOUT, async {
            while let Some(msg) = ws.next().await {
                if let Ok(Message::Close(frame)) = msg {
                    return frame;
                }
            }
            None
        })
        .await
        .unwrap();
        assert_eq!(close.map(|f| f.code), Some(CloseCode::Away));
    }
}

#[tokio::test]
async fn client_arriving_during_shutdown_is_closed() {
    let ts = boot_server(Vec::new()).await;
    ts.server.shutdown().shutdown();

    let mut ws = connect(&ts.ws_url()).await;
    let close = timeout(TIMEOUT, async {
        while let Some(msg) = ws.next().await {
            if let Ok(Message::Close(frame)) = msg {
                return frame;
            }
        }
        None
    })
    .await
    .unwrap();
    assert_eq!(close.map(|f| f.code), Some(CloseCode::Away));
    wait_for_connections(&ts.server, 0).await;
}

#[tokio::test]
async fn shutdown_releases_the_port() {
    let ts = boot_server(Vec::new()).await;
    let addr = ts.addr;
    ts.cancel.cancel();
    timeout(TIMEOUT, ts.handle).await.unwrap().unwrap().unwrap();

    assert!(reqwest::get(format!("http://{addr}/extensions/")).await.is_err());
    assert!(tokio::net::TcpListener::bind(addr).await.is_ok());
}

#[tokio::test]
async fn port_in_use_fails_startup() {
    let ts = boot_server(Vec::new()).await;
    let provider = Arc::new(StaticExtensionProvider::default());
    let config = ServerConfig {
        port: ts.addr.port(),
        ..ServerConfig::default()
    };
    let second = DevServer::new(config, provider);

    let err = second.listen(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
}

// ── HTTP ──

#[tokio::test]
async fn manifest_over_http() {
    let ts = boot_server(vec![Extension::new("a")]).await;
    let resp = reqwest::get(ts.http_url("/extensions/")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers()[reqwest::header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        resp.text().await.unwrap(),
        r#"{"extensions":[{"uuid":"a"}],"version":"1.0"}"#
    );
}

#[tokio::test]
async fn root_redirects_to_manifest() {
    let ts = boot_server(Vec::new()).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = client.get(ts.http_url("/")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers()[reqwest::header::LOCATION], "/extensions/");
}

#[tokio::test]
async fn assets_served_from_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("build")).unwrap();
    std::fs::write(dir.path().join("build/main.js"), "console.log(1);").unwrap();
    let ext = Extension::new("a").with_build_dir(dir.path().to_string_lossy(), "build");
    let ts = boot_server(vec![ext]).await;

    let resp = reqwest::get(ts.http_url("/extensions/a/assets/main.js"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "console.log(1);");

    let missing = reqwest::get(ts.http_url("/extensions/a/assets/nope.js"))
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let unknown = reqwest::get(ts.http_url("/extensions/zzz/assets/main.js"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
}

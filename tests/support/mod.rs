// Shared one-time server bootstrap and WebSocket helpers for integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Boots the server once per test binary and returns its base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Own OS thread and runtime so the server outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                impostor_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub async fn connect() -> Ws {
    let base_url = ensure_server();
    let ws_url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));
    let (ws, _response) = connect_async(ws_url).await.expect("websocket connect");
    ws
}

pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

// Next text frame as JSON; `None` once the server closes the socket.
pub async fn recv_json(ws: &mut Ws) -> Option<Value> {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame");
        match next {
            Some(Ok(Message::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).expect("json frame"));
            }
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => {}
        }
    }
}

// Skips frames until one of the given `type` arrives.
pub async fn recv_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let msg = recv_json(ws)
            .await
            .unwrap_or_else(|| panic!("socket closed while waiting for {kind}"));
        if msg["type"] == kind {
            return msg;
        }
    }
}

// Skips frames until a state snapshot satisfies `predicate`.
pub async fn recv_state_where(ws: &mut Ws, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        let msg = recv_type(ws, "state").await;
        if predicate(&msg["state"]) {
            return msg["state"].clone();
        }
    }
}

pub fn player_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..6])
}

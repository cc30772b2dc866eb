// One arena server per test binary, bound to an ephemeral port.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

static SERVER_ADDR: OnceLock<String> = OnceLock::new();

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts the server on first use and returns its `host:port`.
pub fn ensure_server() -> &'static str {
    SERVER_ADDR.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);

        // A dedicated OS thread and runtime so the server outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                arena_server::run(listener).await.expect("server failed");
            });
        });

        wait_until_accepting(&published)
    })
}

fn wait_until_accepting(published: &OnceLock<String>) -> String {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return addr;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

pub fn http_url(path: &str) -> String {
    format!("http://{}{path}", ensure_server())
}

pub async fn connect() -> Client {
    let url = format!("ws://{}/ws", ensure_server());
    let (client, _) = connect_async(url).await.expect("websocket handshake");
    client
}

pub async fn send(client: &mut Client, msg: Value) {
    client
        .send(Message::Text(msg.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Next JSON text frame, skipping control frames.
pub async fn recv(client: &mut Client) -> Value {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("server should answer in time")
            .expect("stream should stay open")
            .expect("frame should be valid");
        match next {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("server sends JSON");
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Reads frames until one with the given `type` arrives.
pub async fn recv_type(client: &mut Client, kind: &str) -> Value {
    loop {
        let msg = recv(client).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

//! Common test utilities and fixtures for livespec integration tests
//!
//! This module provides:
//! - `TestProject` builder for creating prototype projects on disk
//! - WebSocket helpers for talking to a running transport

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod test_project;

pub use test_project::TestProject;

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Generous upper bound for anything crossing a socket
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for filesystem notifications to arrive
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to a transport on loopback
pub async fn connect(port: u16) -> WsClient {
    let (ws, _) = connect_async(format!("ws://127.0.0.1:{}", port))
        .await
        .expect("Failed to connect to transport");
    ws
}

/// Next text frame parsed as JSON; panics on timeout or close
pub async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Message is not JSON");
        }
    }
}

/// Connect and consume the WELCOME, returning it alongside the client
pub async fn connect_welcomed(port: u16) -> (WsClient, Value) {
    let mut ws = connect(port).await;
    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    (ws, welcome)
}

/// Assert nothing arrives within `window`
pub async fn assert_silent(ws: &mut WsClient, window: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(window, ws.next()).await {
        panic!("Unexpected message: {}", text);
    }
}

/// Poll `check` until it holds or `timeout` elapses
pub async fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

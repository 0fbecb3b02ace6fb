//! Broadcast transport over real loopback sockets

use std::time::Duration;

use futures_util::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use livespec::graph::SpecGraphData;
use livespec::socket_server::{BroadcastTransport, GraphSyncPayload, MessageType, WsMessage};

use crate::common::{assert_silent, connect_welcomed, next_json, wait_until, RECV_TIMEOUT};

async fn started() -> (BroadcastTransport, u16) {
    let transport = BroadcastTransport::new();
    let port = transport
        .start("127.0.0.1", 0)
        .await
        .expect("Transport failed to start");
    (transport, port)
}

#[tokio::test]
async fn welcome_carries_server_identity_and_graph_id() {
    let (transport, port) = started().await;
    transport.set_graph_id(Some("Shop".to_string()));

    let (_ws, welcome) = connect_welcomed(port).await;
    assert_eq!(welcome["payload"]["serverId"], "livespec_server");
    assert_eq!(welcome["payload"]["version"], "1.0.0");
    assert_eq!(welcome["payload"]["graphId"], "Shop");
    assert!(welcome["timestamp"].as_str().unwrap().ends_with('Z'));

    transport.stop().await;
}

#[tokio::test]
async fn graph_sync_reaches_each_client_exactly_once() {
    let (transport, port) = started().await;
    let (mut a, _) = connect_welcomed(port).await;
    let (mut b, _) = connect_welcomed(port).await;
    let (mut c, _) = connect_welcomed(port).await;
    assert_eq!(transport.client_count(), 3);

    let message = WsMessage::new(
        MessageType::GraphSync,
        GraphSyncPayload {
            graph: SpecGraphData::untitled(),
            full_sync: true,
        },
    );
    let expected: serde_json::Value =
        serde_json::from_str(&message.to_json().unwrap()).unwrap();
    assert_eq!(transport.broadcast(&message), 3);

    for ws in [&mut a, &mut b, &mut c] {
        assert_eq!(next_json(ws).await, expected);
        assert_silent(ws, Duration::from_millis(200)).await;
    }

    transport.stop().await;
}

#[tokio::test]
async fn cursor_moves_are_echoed_to_every_client() {
    let (transport, port) = started().await;
    let (mut a, _) = connect_welcomed(port).await;
    let (mut b, _) = connect_welcomed(port).await;
    let (mut c, _) = connect_welcomed(port).await;

    let cursor = json!({
        "type": "cursor:moved",
        "timestamp": "2026-01-01T00:00:00.000Z",
        "payload": {"x": 10, "y": 20, "user": "a"}
    });
    a.send(Message::Text(cursor.to_string())).await.unwrap();

    for ws in [&mut a, &mut b, &mut c] {
        let echoed = next_json(ws).await;
        assert_eq!(echoed["type"], "cursor:moved");
        assert_eq!(echoed["payload"], cursor["payload"]);
        // Stamped by the server, not copied from the sender
        assert_ne!(echoed["timestamp"], cursor["timestamp"]);
    }

    transport.stop().await;
}

#[tokio::test]
async fn cursor_relay_is_a_fresh_envelope() {
    let (transport, port) = started().await;
    let (mut a, _) = connect_welcomed(port).await;
    let (mut b, _) = connect_welcomed(port).await;

    let frame = json!({
        "type": "cursor:moved",
        "payload": {"x": 1},
        "clientSecret": "leak"
    });
    a.send(Message::Text(frame.to_string())).await.unwrap();

    for ws in [&mut a, &mut b] {
        let relayed = next_json(ws).await;
        let keys: Vec<&str> = relayed
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 3);
        for key in ["type", "timestamp", "payload"] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(relayed["payload"], json!({"x": 1}));
        assert!(relayed["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    transport.stop().await;
}

#[tokio::test]
async fn malformed_message_gets_error_reply_only_to_sender() {
    let (transport, port) = started().await;
    let (mut a, _) = connect_welcomed(port).await;
    let (mut b, _) = connect_welcomed(port).await;

    a.send(Message::Text("{not json".to_string())).await.unwrap();

    let reply = next_json(&mut a).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], "INVALID_MESSAGE");
    assert_eq!(reply["payload"]["message"], "Failed to parse message");
    assert_silent(&mut b, Duration::from_millis(200)).await;

    // Still connected and still receiving broadcasts
    let message = WsMessage::new(
        MessageType::GraphSync,
        GraphSyncPayload {
            graph: SpecGraphData::untitled(),
            full_sync: true,
        },
    );
    assert_eq!(transport.broadcast(&message), 2);
    assert_eq!(next_json(&mut a).await["type"], "graph:sync");

    transport.stop().await;
}

#[tokio::test]
async fn disconnect_deregisters_client() {
    let (transport, port) = started().await;
    let (mut a, _) = connect_welcomed(port).await;
    let (_b, _) = connect_welcomed(port).await;
    assert_eq!(transport.client_count(), 2);

    a.close(None).await.unwrap();
    drop(a);

    assert!(wait_until(RECV_TIMEOUT, || transport.client_count() == 1).await);
    transport.stop().await;
}

#[tokio::test]
async fn restart_on_same_port_after_stop() {
    let (transport, port) = started().await;
    let (_ws, _) = connect_welcomed(port).await;

    transport.stop().await;
    assert!(!transport.is_running());
    assert_eq!(transport.client_count(), 0);
    transport.stop().await;

    let again = transport
        .start("127.0.0.1", port)
        .await
        .expect("Port still held after stop");
    assert_eq!(again, port);
    transport.stop().await;
}

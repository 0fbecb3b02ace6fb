//! WebSocket connection handler
//!
//! Registers the client, sends WELCOME, then dispatches inbound frames until
//! the peer disconnects or the transport shuts down.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::socket_server::protocol::{
    ErrorPayload, InboundMessage, MessageType, WelcomePayload, WsMessage,
};
use crate::socket_server::registry::ClientSender;
use crate::socket_server::transport::TransportShared;

/// Handle a single WebSocket connection
pub async fn handle_connection(
    stream: TcpStream,
    shared: Arc<TransportShared>,
    shutdown: watch::Receiver<bool>,
) {
    let addr = stream.peer_addr().ok();

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("[TRANSPORT] Handshake failed for {:?}: {}", addr, e);
            return;
        }
    };

    let client_id = format!("client_{}", uuid::Uuid::new_v4());
    let (mut sink, mut source) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Single writer keeps per-client send order
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    shared.registry.register(client_id.clone(), tx.clone());
    tracing::info!("[TRANSPORT] Client connected: {} ({:?})", client_id, addr);

    let welcome = WsMessage::new(MessageType::Welcome, WelcomePayload::new(shared.graph_id()));
    send_json(&tx, &welcome);

    if let Err(e) = read_loop(&client_id, &mut source, &shared, &tx, shutdown).await {
        tracing::debug!("[TRANSPORT] Connection {} ended with error: {}", client_id, e);
    }

    shared.registry.unregister(&client_id);
    drop(tx);
    let _ = writer.await;
    tracing::info!("[TRANSPORT] Client disconnected: {}", client_id);
}

async fn read_loop<S>(
    client_id: &str,
    source: &mut S,
    shared: &TransportShared,
    tx: &ClientSender,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_text(client_id, &text, shared, tx),
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = tx.send(Message::Close(None));
                    return Ok(());
                }
            }
        }
    }
}

/// Dispatch one inbound text frame
fn handle_text(client_id: &str, text: &str, shared: &TransportShared, tx: &ClientSender) {
    let inbound = match InboundMessage::parse(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!("[TRANSPORT] Unparsable message from {}: {}", client_id, e);
            send_json(tx, &WsMessage::new(MessageType::Error, ErrorPayload::invalid_message()));
            return;
        }
    };

    match inbound.kind() {
        Some(MessageType::Hello) => {
            tracing::info!("[TRANSPORT] Hello from {}: {}", client_id, inbound.payload);
        }
        Some(MessageType::CursorMoved) => {
            // Payload kept as sent; envelope restamped, sender included
            let relay = WsMessage::new(MessageType::CursorMoved, inbound.payload);
            match relay.to_json() {
                Ok(json) => {
                    let delivered = shared.registry.broadcast_text(&json);
                    tracing::debug!(
                        "[TRANSPORT] Relayed cursor from {} to {} clients",
                        client_id,
                        delivered
                    );
                }
                Err(e) => tracing::error!("[TRANSPORT] Failed to serialize cursor relay: {}", e),
            }
        }
        _ => {
            tracing::warn!(
                "[TRANSPORT] Ignoring message type {:?} from {}",
                inbound.raw_type,
                client_id
            );
        }
    }
}

fn send_json<T: serde::Serialize>(tx: &ClientSender, msg: &WsMessage<T>) {
    match msg.to_json() {
        Ok(json) => {
            let _ = tx.send(Message::Text(json));
        }
        Err(e) => tracing::error!("[TRANSPORT] Failed to serialize {}: {}", msg.kind, e),
    }
}

//! Native bridge client against a live transport: reconnect and shutdown

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use livespec::bridge::{BridgeAction, BridgeClient, ConnectionState, ReconnectPolicy};
use livespec::socket_server::{BroadcastTransport, FileChangedPayload, MessageType, WsMessage};

use crate::common::{wait_until, RECV_TIMEOUT};

const DELAY: Duration = Duration::from_millis(300);

struct RunningClient {
    handle: JoinHandle<BridgeClient>,
    actions: mpsc::UnboundedReceiver<BridgeAction>,
    shutdown: watch::Sender<bool>,
}

async fn started() -> (BroadcastTransport, u16) {
    let transport = BroadcastTransport::new();
    let port = transport
        .start("127.0.0.1", 0)
        .await
        .expect("Transport failed to start");
    (transport, port)
}

fn spawn_client(port: u16) -> RunningClient {
    let policy = ReconnectPolicy {
        delay: DELAY,
        max_attempts: 0,
    };
    let mut client = BridgeClient::new(
        format!("ws://127.0.0.1:{}", port),
        "livespec://test",
        policy,
    );
    let (tx, actions) = mpsc::unbounded_channel();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        client.run(tx, shutdown_rx).await;
        client
    });
    RunningClient {
        handle,
        actions,
        shutdown,
    }
}

async fn next_reload(actions: &mut mpsc::UnboundedReceiver<BridgeAction>) -> String {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match actions.recv().await {
                Some(BridgeAction::Reload { file_path }) => return file_path,
                Some(_) => continue,
                None => panic!("Client stopped before reloading"),
            }
        }
    })
    .await
    .expect("Timed out waiting for a reload")
}

#[tokio::test]
async fn reconnects_once_after_restart_and_reloads_on_file_change() {
    let (transport, port) = started().await;
    let mut running = spawn_client(port);
    assert!(wait_until(RECV_TIMEOUT, || transport.client_count() == 1).await);

    let closed_at = Instant::now();
    transport.stop().await;
    transport
        .start("127.0.0.1", port)
        .await
        .expect("Port still held after stop");

    assert!(wait_until(RECV_TIMEOUT, || transport.client_count() == 1).await);
    assert!(closed_at.elapsed() >= DELAY, "reconnected before the delay");

    // One connection per close, not a burst
    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(transport.client_count(), 1);

    let changed = WsMessage::new(
        MessageType::FileChanged,
        FileChangedPayload {
            file_path: "/p/index.html".to_string(),
            content: String::new(),
        },
    );
    assert_eq!(transport.broadcast(&changed), 1);
    assert_eq!(next_reload(&mut running.actions).await, "/p/index.html");

    running.shutdown.send(true).unwrap();
    let client = running.handle.await.unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
    transport.stop().await;
}

#[tokio::test]
async fn shutdown_leaves_client_disconnected_for_good() {
    let (transport, port) = started().await;
    let running = spawn_client(port);
    assert!(wait_until(RECV_TIMEOUT, || transport.client_count() == 1).await);

    running.shutdown.send(true).unwrap();
    let client = tokio::time::timeout(RECV_TIMEOUT, running.handle)
        .await
        .expect("run did not return after shutdown")
        .unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.attempts(), 0);

    assert!(wait_until(RECV_TIMEOUT, || transport.client_count() == 0).await);
    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(transport.client_count(), 0);

    transport.stop().await;
}

#[tokio::test]
async fn manual_disconnect_makes_no_attempts() {
    let (transport, port) = started().await;
    let mut client = BridgeClient::new(
        format!("ws://127.0.0.1:{}", port),
        "livespec://test",
        ReconnectPolicy {
            delay: DELAY,
            max_attempts: 0,
        },
    );
    client.disconnect();

    let (tx, mut actions) = mpsc::unbounded_channel();
    let (_shutdown, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(RECV_TIMEOUT, client.run(tx, shutdown_rx))
        .await
        .expect("run kept going after a manual disconnect");

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.attempts(), 0);
    assert!(actions.recv().await.is_none());

    tokio::time::sleep(DELAY * 2).await;
    assert_eq!(transport.client_count(), 0);
    transport.stop().await;
}

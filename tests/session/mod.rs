//! Project session: open-project, start-server, stop-server

use std::sync::Arc;
use std::time::Duration;

use livespec::server::{EventBus, HostEvent, ProjectSession, SessionOptions};

use crate::common::{connect_welcomed, TestProject, RECV_TIMEOUT};

fn session(watch: bool) -> ProjectSession {
    let options = SessionOptions {
        watch,
        ..SessionOptions::default()
    };
    ProjectSession::new(options, Arc::new(EventBus::default()))
}

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<HostEvent>) -> HostEvent {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for host event")
        .expect("Event bus closed")
}

#[tokio::test]
async fn open_loads_graph_and_pushes_update() {
    let project = TestProject::prototype("Shop");
    let session = session(false);
    let mut events = session.events().subscribe();

    let root = session.open_project(Some(project.path())).await.unwrap();
    assert_eq!(root, project.canonical());

    match next_event(&mut events).await {
        HostEvent::GraphUpdate { graph } => {
            assert_eq!(graph.meta.name, "Shop");
            assert_eq!(graph.nodes.len(), 3);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(session.transport().graph_id().as_deref(), Some("Shop"));
    assert!(!session.state().server_running);
}

#[tokio::test]
async fn selecting_dedicated_dir_opens_parent() {
    let project = TestProject::new();
    project.with_dedicated_graph("Inner");
    let session = session(false);

    let root = session
        .open_project(Some(&project.path().join(".LiveSpec")))
        .await
        .unwrap();
    assert_eq!(root, project.canonical());
    assert_eq!(session.state().graph.unwrap().meta.name, "Inner");
}

#[tokio::test]
async fn missing_selection_is_canceled() {
    let project = TestProject::new();
    let session = session(false);
    assert!(session
        .open_project(Some(&project.path().join("absent")))
        .await
        .is_none());
    assert!(session.state().root_path.is_none());
}

#[tokio::test]
async fn start_welcomes_clients_with_active_graph() {
    let project = TestProject::prototype("Shop");
    let session = session(false);
    session.open_project(Some(project.path())).await.unwrap();
    let mut events = session.events().subscribe();

    let started = session.start_server(Some(0), Some(0)).await;
    assert!(started.success);
    assert_ne!(started.ws_port, 0);
    assert_ne!(started.http_port, 0);

    match next_event(&mut events).await {
        HostEvent::ServerReady { ws_port, http_port } => {
            assert_eq!(ws_port, started.ws_port);
            assert_eq!(http_port, started.http_port);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    let state = session.state();
    assert!(state.server_running);
    assert_eq!(state.ws_port, started.ws_port);

    let (_ws, welcome) = connect_welcomed(started.ws_port).await;
    assert_eq!(welcome["payload"]["graphId"], "Shop");

    let page = reqwest::get(format!("http://127.0.0.1:{}/", started.http_port))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("/__livespec/client.js"));

    session.shutdown().await;
}

#[tokio::test]
async fn stop_releases_ports_and_restart_reuses_them() {
    let project = TestProject::prototype("Shop");
    let session = session(false);
    session.open_project(Some(project.path())).await.unwrap();

    let first = session.start_server(Some(0), Some(0)).await;
    assert!(first.success);

    let stopped = session.stop_server().await;
    assert!(stopped.success);
    assert!(!session.state().server_running);
    assert!(!session.transport().is_running());

    // Stopping twice is harmless
    assert!(session.stop_server().await.success);

    let second = session
        .start_server(Some(first.ws_port), Some(first.http_port))
        .await;
    assert!(second.success);
    assert_eq!(second.ws_port, first.ws_port);
    assert_eq!(second.http_port, first.http_port);

    session.shutdown().await;
}

#[tokio::test]
async fn reopening_tears_servers_down() {
    let first = TestProject::prototype("First");
    let second = TestProject::prototype("Second");
    let session = session(false);

    session.open_project(Some(first.path())).await.unwrap();
    let started = session.start_server(Some(0), Some(0)).await;
    assert!(started.success);

    session.open_project(Some(second.path())).await.unwrap();
    let state = session.state();
    assert!(!state.server_running);
    assert_eq!(state.graph.unwrap().meta.name, "Second");
    assert!(!session.transport().is_running());

    // The old transport port is free again
    let restarted = session.start_server(Some(started.ws_port), Some(0)).await;
    assert!(restarted.success);
    session.shutdown().await;
}

#[tokio::test]
async fn port_conflict_fails_cleanly() {
    let project = TestProject::prototype("Shop");
    let blocker = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let taken = blocker.local_addr().unwrap().port();

    let session = session(false);
    session.open_project(Some(project.path())).await.unwrap();

    let result = session.start_server(Some(0), Some(taken)).await;
    assert!(!result.success);
    assert_eq!(result.ws_port, 0);
    assert_eq!(result.http_port, 0);
    assert!(!session.transport().is_running());
    assert!(!session.state().server_running);

    drop(blocker);
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.shutdown().await;
}

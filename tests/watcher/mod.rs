//! Directory watching end to end: disk edit to transport broadcast

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use livespec::server::{
    ChangeKind, EventBus, HostEvent, ProjectSession, ProjectWatcher, SessionOptions, WatchEvent,
    WatcherConfig,
};

use crate::common::{connect_welcomed, next_json, TestProject, WATCH_TIMEOUT};

/// Let the OS watch settle before editing
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

async fn next_watch_event(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WatchEvent>) -> WatchEvent {
    tokio::time::timeout(WATCH_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for watch event")
        .expect("Watcher channel closed")
}

#[tokio::test]
async fn html_edit_is_classified_and_ignored_dirs_are_skipped() {
    let project = TestProject::new();
    project.add_page("index.html", "Home");
    project.add_file("node_modules/pkg/readme.html", "<p>x</p>");
    let root = project.canonical();

    let watcher = ProjectWatcher::new(WatcherConfig::default());
    let mut rx = watcher.start(&root).unwrap();
    assert!(watcher.is_running());
    settle().await;

    project.add_file("node_modules/pkg/readme.html", "<p>y</p>");
    project.add_file("notes.txt", "not watched");
    project.add_page("index.html", "Home again");

    match next_watch_event(&mut rx).await {
        WatchEvent::FileChanged { path, kind } => {
            assert_eq!(path.file_name().unwrap(), "index.html");
            assert_eq!(kind, ChangeKind::Modified);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    watcher.stop();
    assert!(!watcher.is_running());
    watcher.stop();
}

#[tokio::test]
async fn graph_edit_in_dedicated_dir_is_detected() {
    let project = TestProject::new();
    project.with_dedicated_graph("Before");
    let root = project.canonical();

    let watcher = ProjectWatcher::new(WatcherConfig::default());
    let mut rx = watcher.start(&root).unwrap();
    settle().await;

    project.with_dedicated_graph("After");

    let event = next_watch_event(&mut rx).await;
    assert!(matches!(event, WatchEvent::GraphChanged { .. }));
    assert!(event.path().ends_with(".LiveSpec/spec_graph.json"));
    watcher.stop();
}

#[tokio::test]
async fn live_session_pushes_graph_and_page_changes() {
    let project = TestProject::prototype("Before");
    let session = ProjectSession::new(SessionOptions::default(), Arc::new(EventBus::default()));
    session.open_project(Some(project.path())).await.unwrap();
    assert!(session.is_watching());

    let started = session.start_server(Some(0), Some(0)).await;
    assert!(started.success);
    let mut host = session.events().subscribe();
    let (mut guest, _) = connect_welcomed(started.ws_port).await;
    settle().await;

    // Malformed graph: previous graph retained, nothing broadcast
    project.add_file("spec_graph.json", "{\"meta\": ");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(session.state().graph.unwrap().meta.name, "Before");

    project.with_graph("After");
    let sync = next_json(&mut guest).await;
    assert_eq!(sync["type"], "graph:sync");
    assert_eq!(sync["payload"]["fullSync"], true);
    assert_eq!(sync["payload"]["graph"]["meta"]["name"], "After");
    assert_eq!(session.transport().graph_id().as_deref(), Some("After"));

    let update = tokio::time::timeout(WATCH_TIMEOUT, async {
        loop {
            match host.recv().await {
                Ok(HostEvent::GraphUpdate { graph }) => return Some(graph),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await
    .expect("No graph update pushed to host")
    .expect("Event bus closed");
    assert_eq!(update.meta.name, "After");

    project.add_page("index.html", "Edited");
    // A graph write may settle as more than one batch
    let changed = loop {
        let message = next_json(&mut guest).await;
        if message["type"] != "graph:sync" {
            break message;
        }
    };
    assert_eq!(changed["type"], "file:changed");
    assert!(changed["payload"]["filePath"]
        .as_str()
        .unwrap()
        .ends_with("index.html"));
    assert_eq!(changed["payload"]["content"], "");

    session.shutdown().await;
    assert!(!session.is_watching());
}

//! Content server: static files, HTML rewriting and the bridge endpoint

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use livespec::http_server::inject::BRIDGE_SCRIPT_TAG;
use livespec::http_server::ContentServer;

use crate::common::TestProject;

async fn serve(project: &TestProject, ws_port: u16) -> (ContentServer, String) {
    let server = ContentServer::default();
    let port = server
        .start(project.path(), 0, ws_port)
        .await
        .expect("Content server failed to start");
    (server, format!("http://127.0.0.1:{}", port))
}

#[tokio::test]
async fn html_pages_get_the_bridge_tag_once() {
    let project = TestProject::new();
    project.add_page("index.html", "Home");
    project.add_file(
        "already.html",
        "<html><body><script src=\"/__livespec/client.js\"></script></body></html>",
    );
    let (server, base) = serve(&project, 3899).await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(response.status(), 200);
    let declared = response.content_length();
    let body = response.text().await.unwrap();
    assert_eq!(body.matches(BRIDGE_SCRIPT_TAG).count(), 1);
    assert!(body.contains(&format!("{}</body>", BRIDGE_SCRIPT_TAG)));
    if let Some(len) = declared {
        assert_eq!(len as usize, body.len());
    }

    let body = reqwest::get(format!("{}/already.html", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body.matches("/__livespec/client.js").count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn head_reports_the_rewritten_length() {
    let project = TestProject::new();
    project.add_page("index.html", "Home");
    project.add_file("style.css", "body { color: red; }");
    let (server, base) = serve(&project, 3899).await;
    let client = reqwest::Client::new();

    let page = reqwest::get(format!("{}/index.html", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(BRIDGE_SCRIPT_TAG));

    let head = client
        .head(format!("{}/index.html", base))
        .send()
        .await
        .unwrap();
    assert_eq!(head.status(), 200);
    assert!(head.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    if let Some(len) = head.headers().get(CONTENT_LENGTH) {
        assert_eq!(len.to_str().unwrap().parse::<usize>().unwrap(), page.len());
    }
    assert!(head.text().await.unwrap().is_empty());

    let css_head = client
        .head(format!("{}/style.css", base))
        .send()
        .await
        .unwrap();
    assert_eq!(css_head.status(), 200);
    if let Some(len) = css_head.headers().get(CONTENT_LENGTH) {
        assert_eq!(len.to_str().unwrap(), "20");
    }

    server.stop().await;
}

#[tokio::test]
async fn non_html_passes_through_untouched() {
    let project = TestProject::new();
    let css = "body { color: red; } /* </body> */";
    project.add_file("style.css", css);
    let (server, base) = serve(&project, 3899).await;

    let body = reqwest::get(format!("{}/style.css", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, css);

    let missing = reqwest::get(format!("{}/nope.html", base)).await.unwrap();
    assert_eq!(missing.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn dedicated_directory_is_preferred() {
    let project = TestProject::new();
    project.add_page("index.html", "Outer");
    project.add_page(".LiveSpec/index.html", "Inner");
    let (server, base) = serve(&project, 3899).await;

    let body = reqwest::get(format!("{}/index.html", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Inner"));
    assert!(!body.contains("Outer"));

    server.stop().await;
}

#[tokio::test]
async fn health_reports_root() {
    let project = TestProject::new();
    let (server, base) = serve(&project, 3899).await;

    let health: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["rootPath"], project.path().display().to_string());
    assert!(health["timestamp"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn bridge_script_is_served_with_its_transport_port() {
    let project = TestProject::new();
    let (server, base) = serve(&project, 4321).await;

    let response = reqwest::get(format!("{}/__livespec/client.js", base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/javascript"));

    let body = response.text().await.unwrap();
    assert!(body.starts_with("window.__LIVESPEC_CONFIG__ = {"));
    assert!(body.contains("\"wsPort\":4321"));
    assert!(body.contains("__LIVESPEC_INITIALIZED__"));

    server.stop().await;
}

#[tokio::test]
async fn occupied_port_is_reported() {
    let project = TestProject::new();
    let (first, base) = serve(&project, 3899).await;
    let port = first.port().unwrap();

    let second = ContentServer::default();
    let err = second
        .start(project.path(), port, 3899)
        .await
        .expect_err("Second bind should fail");
    assert!(err.is_addr_in_use());
    assert!(!second.is_running());

    // Stop releases the port for a fresh start
    first.stop().await;
    let again = second.start(project.path(), port, 3899).await.unwrap();
    assert_eq!(again, port);
    assert!(reqwest::get(format!("{}/health", base)).await.is_ok());
    second.stop().await;
}

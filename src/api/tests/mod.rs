use super::*;
use crate::test_helpers::{exit_failed, exit_ok, scripted_fetcher};
use crate::types::ExitOutcome;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tower::ServiceExt;


/// Build a router over a scripted fetcher; returns the router and the
/// tempdir backing the output directory (which must be kept alive).
fn scripted_app(
    lines: Vec<String>,
    outcome: ExitOutcome,
) -> (Router, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(scripted_fetcher(temp_dir.path(), lines, outcome));
    let config = fetcher.config.clone();
    (create_router(fetcher, config), temp_dir)
}

#[tokio::test]
async fn api_server_spawns() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.fetch.output_dir = temp_dir.path().to_path_buf();
    // Port 0 = OS assigns a free port
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let fetcher = Arc::new(crate::test_helpers::scripted_fetcher(
        temp_dir.path(),
        vec![],
        exit_ok(),
    ));
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let fetcher = fetcher.clone();
        let config = config.clone();
        async move { start_api_server(fetcher, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _temp_dir) = scripted_app(vec![], exit_ok());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn basic_auth_guards_all_routes_when_configured() {
    let temp_dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(scripted_fetcher(temp_dir.path(), vec![], exit_ok()));
    let mut config = (*fetcher.config).clone();
    config.api.basic_auth = Some(crate::config::BasicAuthConfig {
        username: "admin".to_string(),
        password: "changeme".to_string(),
    });
    let app = create_router(fetcher, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

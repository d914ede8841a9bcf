mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use common::{body_string, build_get, create_test_app, setup_temp_dir};
use handoff::config::ShareConfig;
use handoff::server::{auth, AppState};

#[tokio::test]
async fn missing_token_is_forbidden() {
    let dir = setup_temp_dir();
    let (app, _token) = create_test_app(None, dir.path().to_path_buf());

    let response = app.oneshot(build_get("/download")).await.expect("send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "forbidden");
}

#[tokio::test]
async fn empty_token_is_forbidden() {
    let dir = setup_temp_dir();
    let (app, _token) = create_test_app(None, dir.path().to_path_buf());

    let response = app
        .oneshot(build_get("/download?token="))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_token_is_forbidden_on_every_route() {
    let dir = setup_temp_dir();
    let (app, token) = create_test_app(None, dir.path().to_path_buf());
    let bad = format!("{token}ff");

    for uri in ["/", "/download"] {
        let response = app
            .clone()
            .oneshot(build_get(&format!("{uri}?token={bad}")))
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "route {uri}");
    }
}

#[tokio::test]
async fn correct_token_reaches_handler() {
    let dir = setup_temp_dir();
    let (app, token) = create_test_app(None, dir.path().to_path_buf());

    let response = app
        .oneshot(build_get(&format!("/?token={token}")))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejected_request_never_invokes_handler() {
    let dir = setup_temp_dir();
    let config = ShareConfig::new(None, Some(dir.path().to_path_buf()), 0).expect("valid config");
    let token = config.token.clone();
    let state = AppState::new(config);

    let hits = Arc::new(AtomicUsize::new(0));
    let probe = hits.clone();
    let app = Router::new()
        .route(
            "/probe",
            get(move || {
                let probe = probe.clone();
                async move {
                    probe.fetch_add(1, Ordering::SeqCst);
                    "hit"
                }
            }),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .with_state(state);

    let response = app
        .clone()
        .oneshot(build_get("/probe?token=nope"))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(hits.load(Ordering::SeqCst), 0, "handler must not run");

    let response = app
        .oneshot(build_get(&format!("/probe?token={token}")))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_download_does_not_touch_the_target() {
    let dir = setup_temp_dir();
    let target = dir.path().join("report.pdf");
    std::fs::write(&target, b"bytes").unwrap();

    let (app, _token) = create_test_app(Some(target.clone()), dir.path().to_path_buf());

    // Remove the target after startup: an unauthorized request must still be
    // a clean 403, proving the guard short-circuits before any stat/open.
    std::fs::remove_file(&target).unwrap();

    let response = app
        .oneshot(build_get("/download?token=wrong"))
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

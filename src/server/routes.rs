//! Router assembly. Layer order matters: the token gate is innermost so
//! rejected requests still pass through (and get logged by) `TraceLayer`.

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info_span, Level};

use crate::server::{auth, handlers, state::AppState};

pub fn build_router(state: &AppState) -> Router {
    // Span carries the path only — the query string holds the token and
    // must never reach the logs. Events at INFO so every request shows up
    // under the default filter, auth rejections included.
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            info_span!("request", method = %request.method(), path = %request.uri().path())
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(handlers::home))
        .route("/download", get(handlers::download))
        .route("/upload", post(handlers::upload))
        // Uploads are whole files; no artificial body cap.
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .layer(trace)
        .with_state(state.clone())
}

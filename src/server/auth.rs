//! Token gate applied ahead of every handler.

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::server::state::AppState;

#[derive(Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Compares a presented token against the shared secret without an early
/// exit on the first differing byte. Unequal lengths compare unequal.
pub fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Middleware: reject the request with 403 unless `?token=` matches the
/// shared secret. Runs before any handler touches the filesystem. The
/// presented value is never logged.
pub async fn require_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = query.token.as_deref().unwrap_or("");
    if !token_matches(presented, state.token()) {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

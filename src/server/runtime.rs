//! Session wiring: resolve the LAN address once, advertise the URL, serve.

use anyhow::{Context, Result};

use crate::config::ShareConfig;
use crate::server::routes;
use crate::server::state::AppState;
use crate::{net, output};

/// Builds the advertised URL, prints the banner, and serves until Ctrl+C.
///
/// All validation already happened in `ShareConfig::new`; failures past
/// this point are per-request, not fatal.
pub async fn run(config: ShareConfig) -> Result<()> {
    let state = AppState::new(config);

    // Resolved once; the URL is immutable for the process lifetime.
    let ip = net::resolve_lan_ip()?;
    let port = state.config.port;
    let url = format!("http://{ip}:{port}/?token={token}", token = state.token());

    let app = routes::build_router(&state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port} - is it already in use?"))?;

    output::print_banner(&url);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use handoff::config::{ShareConfig, DEFAULT_PORT};
use handoff::server;

#[derive(Parser)]
#[command(name = "handoff")]
#[command(about = "One-shot LAN file exchange with a scannable connection code")]
struct Cli {
    /// File served on /download
    #[arg(long)]
    download: Option<PathBuf>,

    /// Directory uploads are saved to (default: current directory)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("handoff=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Any validation failure here exits non-zero before the listener starts.
    let config = ShareConfig::new(cli.download, cli.upload_dir, cli.port)?;

    server::run(config).await
}

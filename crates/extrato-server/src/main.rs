//! Extrato server binary
//!
//! Usage:
//!   extrato-server --port 8000
//!   extrato-server --config config/settings.yaml

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extrato_core::Settings;

#[derive(Parser)]
#[command(name = "extrato-server", about = "Statement OCR service", version)]
struct Cli {
    /// Host to bind
    #[arg(long, env = "EXTRATO_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(long, env = "EXTRATO_PORT")]
    port: Option<u16>,

    /// Path to a YAML settings file
    #[arg(long, env = "EXTRATO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    let host = cli.host.unwrap_or_else(|| settings.server.host.clone());
    let port = cli.port.unwrap_or(settings.server.port);

    let state = extrato_server::build_state(settings)?;
    extrato_server::serve(state, &host, port).await
}

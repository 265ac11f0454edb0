//! imagegend - prompt-to-image HTTP gateway
//!
//! Serves `POST /api/generate` (and optionally `GET /api/logs`) behind a
//! bearer-token gate. Configuration comes from flags and the environment;
//! a `.env` file in the working directory is loaded first.

mod auth;
mod routes;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use imagegen_core::telemetry::{init_tracing, LogFormat};
use imagegen_core::{
    Orchestrator, PollConfig, ProviderConfig, SurrealAuditLog, TokenDigestResolver, TokioClock,
    WavespeedClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

use crate::server::AppState;

#[derive(Parser, Debug)]
#[command(name = "imagegend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prompt-to-image generation gateway", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "IMAGEGEN_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Log line format: text, compact or json
    #[arg(long, env = "IMAGEGEN_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Expose GET /api/logs (audit trail reporting)
    #[arg(long, env = "IMAGEGEN_ENABLE_LOGS")]
    enable_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(args.log_format, level);

    let provider = ProviderConfig::from_env().context("Invalid provider configuration")?;
    let poll = PollConfig::from_env().context("Invalid polling configuration")?;
    let identities = TokenDigestResolver::from_env().context("Invalid access token table")?;
    if identities.is_empty() {
        warn!("IMAGEGEN_ACCESS_TOKENS grants no tokens; every request will be rejected");
    }

    let audit_log = Arc::new(
        SurrealAuditLog::from_env()
            .await
            .context("Failed to open audit store")?,
    );
    let client = WavespeedClient::new(provider).context("Failed to build provider client")?;
    let orchestrator = Orchestrator::new(
        Arc::new(client),
        audit_log.clone(),
        Arc::new(TokioClock),
        poll,
    );

    info!(
        poll_attempts = poll.max_attempts,
        poll_interval_ms = poll.interval.as_millis() as u64,
        logs_enabled = args.enable_logs,
        "imagegend starting"
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        audit_log,
        identities: Arc::new(identities),
        logs_enabled: args.enable_logs,
        shutdown: CancellationToken::new(),
    };

    server::run(state, args.bind).await
}

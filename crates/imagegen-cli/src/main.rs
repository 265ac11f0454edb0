//! imagegen - operator CLI
//!
//! Runs one-shot generations against the configured provider and inspects
//! the audit trail.
//!
//! ## Commands
//!
//! - `generate`: run one generation and print the result as JSON
//! - `logs`: show recent audit records, newest first
//! - `stats`: show record counts grouped by status

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imagegen_core::telemetry::{init_tracing, LogFormat};
use imagegen_core::{
    logs_report, AuditLog, AuditQuery, GenerationRequest, Orchestrator, PollConfig,
    ProviderConfig, RequesterIdentity, SurrealAuditLog, TokioClock, WavespeedClient,
};
use imagegen_state::StoreConfig;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "imagegen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prompt-to-image generation gateway CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one image and record it in the audit trail
    Generate {
        /// Text prompt
        #[arg(short, long)]
        prompt: String,

        /// Requester identity recorded in the audit trail
        #[arg(long = "as", env = "IMAGEGEN_REQUESTER", default_value = "cli@localhost")]
        requester: String,
    },

    /// Show recent audit records
    Logs {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = imagegen_state::DEFAULT_LIST_LIMIT)]
        limit: usize,

        /// Only records of this requester
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show record counts by status
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_tracing(format, level);

    let store = StoreConfig::from_env();
    info!(store = %store.describe(), "opening audit store");
    let log = Arc::new(
        SurrealAuditLog::connect(&store)
            .await
            .context("Failed to open audit store")?,
    );

    let output = match cli.command {
        Commands::Generate { prompt, requester } => {
            let provider = ProviderConfig::from_env().context("Invalid provider configuration")?;
            let poll = PollConfig::from_env().context("Invalid polling configuration")?;
            let client = WavespeedClient::new(provider).context("Failed to build provider client")?;
            let orchestrator =
                Orchestrator::new(Arc::new(client), log.clone(), Arc::new(TokioClock), poll);

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            cmd_generate(&orchestrator, &requester, prompt, &cancel).await?
        }
        Commands::Logs { limit, user } => cmd_logs(log.as_ref(), limit, user.as_deref()).await?,
        Commands::Stats => cmd_stats(log.as_ref()).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run one generation. Failures are reported in the output, not as a CLI error.
async fn cmd_generate(
    orchestrator: &Orchestrator,
    requester: &str,
    prompt: String,
    cancel: &CancellationToken,
) -> Result<Value> {
    let requester =
        RequesterIdentity::new(requester).context("Requester identity must not be empty")?;
    let request = GenerationRequest::new(requester, prompt);

    let output = match orchestrator.generate_with_cancel(request, cancel).await {
        Ok(success) => json!({
            "imageUrl": success.image_url,
            "generationTimeSeconds": success.generation_time_seconds,
            "auditId": success.audit_id.map(|id| id.to_string()),
        }),
        Err(e) => json!({
            "error": e.to_string(),
            "status": e.http_status(),
        }),
    };
    Ok(output)
}

async fn cmd_logs(log: &dyn AuditLog, limit: usize, user: Option<&str>) -> Result<Value> {
    let mut query = AuditQuery::default().with_limit(limit);
    if let Some(user) = user {
        query = query.for_requester(user);
    }

    let report = logs_report(log, &query)
        .await
        .context("Failed to read audit trail")?;
    Ok(serde_json::to_value(report)?)
}

async fn cmd_stats(log: &dyn AuditLog) -> Result<Value> {
    let counts = log
        .count_by_status()
        .await
        .context("Failed to count audit records")?;
    Ok(json!({
        "success": counts.success,
        "failed": counts.failed,
        "error": counts.error,
        "total": counts.total(),
    }))
}

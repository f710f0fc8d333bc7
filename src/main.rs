use aerolens::config::Config;
use aerolens::record::SourceStatusReport;
use aerolens::render::{NoopRenderSink, RenderSink, StdoutRenderSink};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Collect, merge, and render a multi-source intelligence brief.
#[derive(Debug, Parser)]
#[command(name = "aerolens-cli", version, about)]
struct Cli {
    /// Identity passed through to the narrative service.
    #[arg(long, env = "AEROLENS_USER_ID", default_value = "aerolens-cli")]
    user_id: String,

    /// Conversation/session identity for the narrative service.
    #[arg(long, env = "AEROLENS_CONVERSATION_ID", default_value = "default")]
    conversation_id: String,

    /// How many days back to query the trade service.
    #[arg(long, default_value_t = 90)]
    trade_days_back: i64,

    /// Skip the rendering step; useful for smoke-testing collection only.
    #[arg(long)]
    no_render: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match try_main(cli).await {
        Ok(status) if status.any_success() => ExitCode::SUCCESS,
        Ok(_) => {
            tracing::error!("all sources failed or were unconfigured");
            ExitCode::FAILURE
        }
        Err(e) => {
            // anyhow's chain here (not thiserror's inside the library) is
            // what gives the operator the full causal trail at the CLI
            // boundary.
            tracing::error!(error = format!("{e:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<SourceStatusReport> {
    let config = Arc::new(Config::from_env());
    let sink: Box<dyn RenderSink> = if cli.no_render { Box::new(NoopRenderSink) } else { Box::new(StdoutRenderSink) };

    aerolens::run(config, cli.user_id, cli.conversation_id, cli.trade_days_back, sink.as_ref())
        .await
        .context("intelligence collection run failed")
}

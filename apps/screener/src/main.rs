mod artifacts;
mod cli;
mod config;
mod errors;
mod inference;
mod llm_client;
mod models;
mod pipeline;
mod stages;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration comes before logging so RUST_LOG from .env is honoured
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("screener v{}", env!("CARGO_PKG_VERSION"));

    match cli::run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

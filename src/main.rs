// src/main.rs

//! devquiz
//!
//! Entry point for the devquiz CLI.
//!
//! Reads a CSV of quiz submissions, runs every linked Go Playground snippet
//! on the remote playground and prints one verdict line per row.
//!
//! Responsibilities of this file:
//! - Load `.env` and initialise logging
//! - Parse CLI arguments
//! - Hand off execution to the runner

mod cli;
mod config;
mod engine;
mod playground;
mod report;
mod runner;
mod snippet;
mod source;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Program entry point.
///
/// Rows are processed one at a time; Tokio only drives the HTTP calls.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devquiz=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    runner::run(cli).await
}

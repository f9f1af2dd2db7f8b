// src/cli.rs

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Validate Go Playground submissions listed in a CSV file.
///
/// Every row whose URL points at the playground is fetched, run remotely
/// and reported as ok, skip or failed.
#[derive(Parser, Debug)]
#[command(name = "devquiz", version)]
pub struct Cli {
    /// Path to the CSV file with submissions
    pub csv: PathBuf,

    /// Treat the first record as data
    ///
    /// Without this flag the first record is discarded as a header.
    #[arg(long = "withheader", overrides_with = "no_with_header")]
    pub with_header: bool,

    /// Discard the first record even if the config file says otherwise
    #[arg(long = "no-withheader", overrides_with = "with_header")]
    pub no_with_header: bool,

    /// Column holding the snippet URL (default 6)
    #[arg(long = "urlrow", value_name = "N")]
    pub url_row: Option<usize>,

    /// Column holding the submitter name (default 1)
    #[arg(long = "namerow", value_name = "N")]
    pub name_row: Option<usize>,

    /// Column holding the category (default 0, currently unused)
    #[arg(long = "categoryrow", value_name = "N")]
    pub category_row: Option<usize>,

    /// Optional YAML config file
    ///
    /// CLI flags override values from this file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format printed to stdout
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Also write the full report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the playground base URL
    ///
    /// Example:
    /// --playground-url https://play.golang.org
    #[arg(long, env = "DEVQUIZ_PLAYGROUND_URL")]
    pub playground_url: Option<String>,
}

/// Stdout report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `<index> <name> <verdict>` lines
    #[default]
    Text,
    /// One JSON object per row
    Json,
}

// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::cli::{Cli, ReportFormat};

/// Root configuration, optionally loaded from a YAML file.
///
/// Every field has a default, so running without a config file is the
/// common case. CLI flags override whatever the file says.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// CSV column indices
    #[serde(default)]
    pub columns: Columns,

    /// When false the first CSV record is discarded as a header
    #[serde(default)]
    pub with_header: bool,

    /// Remote playground settings
    #[serde(default)]
    pub playground: Playground,

    /// Report configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Column indices into each CSV record.
///
/// Example:
///
/// columns:
///   url: 6
///   name: 1
///   category: 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Columns {
    #[serde(default = "default_url_column")]
    pub url: usize,

    #[serde(default = "default_name_column")]
    pub name: usize,

    /// Carried through to each row but not used for classification.
    #[serde(default)]
    pub category: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            url: default_url_column(),
            name: default_name_column(),
            category: 0,
        }
    }
}

fn default_url_column() -> usize {
    6
}

fn default_name_column() -> usize {
    1
}

/// Playground endpoints.
///
/// Example:
///
/// playground:
///   base_url: https://play.golang.org
///   snippet_prefixes:
///     - https://play.golang.org
///   timeout_secs: 30
#[derive(Debug, Clone, Deserialize)]
pub struct Playground {
    /// Base URL of the compile service (`<base_url>/compile`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// URLs starting with one of these are fetched and run; all others skip
    #[serde(default = "default_snippet_prefixes")]
    pub snippet_prefixes: Vec<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Playground {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            snippet_prefixes: default_snippet_prefixes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub const PLAYGROUND_BASE_URL: &str = "https://play.golang.org";

fn default_base_url() -> String {
    PLAYGROUND_BASE_URL.to_string()
}

fn default_snippet_prefixes() -> Vec<String> {
    vec![PLAYGROUND_BASE_URL.to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

/// Report configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// Optional JSON report file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load and parse a YAML config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let cfg: Config = serde_yaml::from_str(&raw).context("Failed to parse YAML config")?;

        Ok(cfg)
    }

    /// Build the effective config: file (if any), then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if cli.with_header {
            cfg.with_header = true;
        } else if cli.no_with_header {
            cfg.with_header = false;
        }
        if let Some(i) = cli.url_row {
            cfg.columns.url = i;
        }
        if let Some(i) = cli.name_row {
            cfg.columns.name = i;
        }
        if let Some(i) = cli.category_row {
            cfg.columns.category = i;
        }
        if let Some(format) = cli.format {
            cfg.output.format = format;
        }
        if let Some(path) = &cli.output {
            cfg.output.file = Some(path.clone());
        }
        if let Some(url) = &cli.playground_url {
            // A custom playground hosts its own snippets
            let url = url.trim_end_matches('/').to_string();
            if !cfg.playground.snippet_prefixes.contains(&url) {
                cfg.playground.snippet_prefixes.push(url.clone());
            }
            cfg.playground.base_url = url;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would make every row fail the same way.
    pub fn validate(&self) -> Result<()> {
        check_http_url("playground.base_url", &self.playground.base_url)?;

        if self.playground.snippet_prefixes.is_empty() {
            bail!("playground.snippet_prefixes must contain at least one URL prefix");
        }
        for prefix in &self.playground.snippet_prefixes {
            check_http_url("playground.snippet_prefixes", prefix)?;
        }

        if self.playground.timeout_secs == 0 {
            bail!("playground.timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{} must not be empty", field);
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        bail!("{} must be an http(s) URL, got {:?}", field, value);
    }
    Ok(())
}

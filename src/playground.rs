// src/playground.rs

//! Go Playground compile service.
//!
//! `POST <base>/compile` with a form body runs a program remotely and answers
//! with a JSON run trace:
//!
//! {"Errors": "", "Events": [{"Message": "hello\n", "Kind": "stdout", "Delay": 0}]}
//!
//! `Errors` carries build failures; runtime output arrives as events.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// One unit of program output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunEvent {
    #[serde(rename = "Message", default, deserialize_with = "null_as_default")]
    pub message: String,

    /// "stdout" or "stderr"
    #[serde(rename = "Kind", default, deserialize_with = "null_as_default")]
    pub kind: String,

    /// Nanoseconds since the previous event. Informational only.
    #[serde(rename = "Delay", default)]
    pub delay: i64,
}

/// Outcome of one remote run. Events are in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunResult {
    #[serde(rename = "Errors", default, deserialize_with = "null_as_default")]
    pub errors: String,

    #[serde(rename = "Events", default, deserialize_with = "null_as_default")]
    pub events: Vec<RunEvent>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Something that can run Go source and return its trace.
pub trait CodeRunner {
    async fn run(&self, src: &str) -> Result<RunResult>;
}

/// Build the HTTP client shared by the snippet fetcher and the runner.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("devquiz/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Client for the playground compile endpoint.
#[derive(Debug, Clone)]
pub struct PlaygroundClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlaygroundClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CodeRunner for PlaygroundClient {
    async fn run(&self, src: &str) -> Result<RunResult> {
        let url = format!("{}/compile", self.base_url);
        tracing::debug!(%url, bytes = src.len(), "submitting source");

        let resp = self
            .client
            .post(url)
            .form(&[("version", "2"), ("body", src)])
            .send()
            .await
            .context("Failed to call playground compile")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("Failed to read playground compile response")?;

        if !status.is_success() {
            bail!("playground compile failed: {} {}", status, text.trim());
        }

        let result: RunResult =
            serde_json::from_str(&text).context("playground compile returned invalid JSON")?;
        Ok(result)
    }
}

// src/snippet.rs

//! Snippet page fetching.
//!
//! A shared playground page embeds the program in the element with id
//! `code`. The page is fetched and that element's text is returned as-is.

use anyhow::{anyhow, bail, Context, Result};
use scraper::{Html, Selector};

/// Element holding the program source on a snippet page.
const CODE_SELECTOR: &str = "#code";

/// Something that can turn a snippet URL into source text.
pub trait SnippetFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches snippet pages over HTTP.
#[derive(Debug, Clone)]
pub struct SnippetPages {
    client: reqwest::Client,
}

impl SnippetPages {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SnippetFetcher for SnippetPages {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "fetching snippet page");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }

        let body = resp.text().await.context("Failed to read snippet page")?;
        extract_code(&body)
    }
}

/// Pull the program text out of a snippet page.
pub fn extract_code(page: &str) -> Result<String> {
    let selector = Selector::parse(CODE_SELECTOR)
        .map_err(|e| anyhow!("invalid selector {}: {}", CODE_SELECTOR, e))?;

    let document = Html::parse_document(page);
    let mut matches = document.select(&selector).peekable();

    if matches.peek().is_none() {
        bail!("no {} element in snippet page", CODE_SELECTOR);
    }

    Ok(matches.flat_map(|el| el.text()).collect())
}

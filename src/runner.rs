// src/runner.rs

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::RowValidator;
use crate::playground::{http_client, PlaygroundClient};
use crate::report::{drive, Reporter};
use crate::snippet::SnippetPages;
use crate::source::CsvRows;
use crate::util::write_json_file;

use anyhow::Result;
use std::io::stdout;

/// Entry point from `main.rs`.
///
/// Returns an error only for startup problems or a fatal pipeline error;
/// failed rows are printed and the run still succeeds.
pub async fn run(cli: Cli) -> Result<()> {
    let cfg = Config::resolve(&cli)?;
    tracing::debug!(?cfg, "resolved config");

    let source = CsvRows::open(&cli.csv, cfg.with_header)?;

    let client = http_client(cfg.playground.timeout_secs)?;
    let fetcher = SnippetPages::new(client.clone());
    let runner = PlaygroundClient::new(client, &cfg.playground.base_url);

    let mut validator = RowValidator::new(
        source,
        cfg.columns,
        cfg.playground.snippet_prefixes.clone(),
        fetcher,
        runner,
    );

    let mut reporter = Reporter::new(stdout().lock(), cfg.output.format)
        .keep_records(cfg.output.file.is_some());
    let outcome = drive(&mut validator, &mut reporter).await;

    let totals = reporter.totals();
    tracing::info!(
        rows = totals.rows,
        ok = totals.ok,
        skip = totals.skip,
        failed = totals.failed,
        "run finished"
    );

    if let Some(path) = &cfg.output.file {
        match write_json_file(path, &reporter.document(outcome.as_ref().err())) {
            Ok(()) => tracing::info!(path = %path.display(), "report written"),
            // The pipeline error is the one to surface
            Err(e) if outcome.is_err() => tracing::error!(
                path = %path.display(),
                error = %format!("{:#}", e),
                "failed to write report"
            ),
            Err(e) => return Err(e),
        }
    }

    outcome
}

// src/report.rs

//! Report driver.
//!
//! Pulls rows from the validator one at a time, classifies each and prints
//! one line per row:
//!
//! 1 alice ok
//! 2 bob skip
//! 3 carol failed("cannot get src: ...")
//!
//! Per-row failures are reported, never propagated. A fatal validator error
//! stops the loop and is returned to the caller after the rows seen so far
//! have been printed.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::cli::ReportFormat;
use crate::engine::{classify, RowOutcome, RowValidator, Verdict};
use crate::playground::CodeRunner;
use crate::snippet::SnippetFetcher;
use crate::source::RowSource;

/// One reported row.
#[derive(Debug, Clone, Serialize)]
pub struct RowRecord {
    pub index: usize,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub verdict: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Verdict counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub rows: usize,
    pub ok: usize,
    pub skip: usize,
    pub failed: usize,
}

impl Totals {
    fn count(&mut self, verdict: &Verdict) {
        self.rows += 1;
        match verdict {
            Verdict::Ok => self.ok += 1,
            Verdict::Skip => self.skip += 1,
            Verdict::Failed(_) => self.failed += 1,
        }
    }
}

/// Full report as written to `--output`.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub ok: bool,
    pub totals: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub rows: &'a [RowRecord],
}

/// Prints verdicts; keeps the printed rows only when a report file wants them.
pub struct Reporter<W> {
    out: W,
    format: ReportFormat,
    keep_records: bool,
    records: Vec<RowRecord>,
    totals: Totals,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
            keep_records: false,
            records: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Retain every row for [`document`](Self::document).
    pub fn keep_records(mut self, keep: bool) -> Self {
        self.keep_records = keep;
        self
    }

    /// Classify and print one row. `index` is 1-based.
    pub fn record(&mut self, index: usize, row: RowOutcome) -> Result<Verdict> {
        let verdict = classify(&row);
        let record = record_for(index, row, &verdict);

        match self.format {
            ReportFormat::Text => writeln!(self.out, "{} {} {}", index, record.name, verdict),
            ReportFormat::Json => {
                let line =
                    serde_json::to_string(&record).context("Failed to format row as JSON")?;
                writeln!(self.out, "{}", line)
            }
        }
        .context("Failed to write report line")?;

        self.totals.count(&verdict);
        if self.keep_records {
            self.records.push(record);
        }

        Ok(verdict)
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Snapshot for the report file; `error` is the fatal error, if any.
    pub fn document(&self, error: Option<&anyhow::Error>) -> ReportDocument<'_> {
        ReportDocument {
            ok: error.is_none(),
            totals: self.totals,
            error: error.map(|e| format!("{:#}", e)),
            rows: &self.records,
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush report output")
    }
}

fn record_for(index: usize, row: RowOutcome, verdict: &Verdict) -> RowRecord {
    RowRecord {
        index,
        name: row.name,
        url: row.url,
        category: row.category,
        verdict: verdict.label(),
        reason: verdict.reason().map(str::to_string),
    }
}

/// Drive the validator to the end, reporting every consumed row.
pub async fn drive<S, F, R, W>(
    validator: &mut RowValidator<S, F, R>,
    reporter: &mut Reporter<W>,
) -> Result<()>
where
    S: RowSource,
    F: SnippetFetcher,
    R: CodeRunner,
    W: Write,
{
    let mut index = 0;

    let result = loop {
        match validator.next().await {
            Ok(Some(row)) => {
                index += 1;
                let verdict = reporter.record(index, row)?;
                tracing::debug!(index, verdict = verdict.label(), "row classified");
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    reporter.flush()?;
    result
}

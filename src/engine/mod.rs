use anyhow::Error;

use crate::playground::RunResult;

pub mod validator;
pub mod verdict;

pub use validator::RowValidator;
pub use verdict::{classify, Verdict};

/* ---------------- per-row state ---------------- */

/// What happened to one row.
///
/// Exactly one of these per consumed row; a run result and a per-row error
/// never coexist.
#[derive(Debug)]
pub enum Execution {
    /// URL empty or not a playground snippet. No network calls were made.
    Skipped,
    /// Snippet fetched and run.
    Executed(RunResult),
    /// Fetch or run failed. Later rows are still processed.
    Failed(Error),
}

/// One consumed row, as produced by [`RowValidator::next`].
#[derive(Debug)]
pub struct RowOutcome {
    pub name: String,
    pub url: String,
    /// Reserved; never consulted by classification.
    pub category: Option<String>,
    pub execution: Execution,
}

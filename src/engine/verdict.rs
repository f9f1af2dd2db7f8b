use std::fmt;

use crate::engine::{Execution, RowOutcome};
use crate::playground::RunResult;

/// Marker that flags a failing program in stdout.
const FAIL_MARKER: &str = "FAIL";

/// Final classification of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Skip,
    Failed(String),
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::Skip => "skip",
            Verdict::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// `ok`, `skip` or `failed("<reason>")` with the reason quoted and escaped.
impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Failed(reason) => write!(f, "failed({})", quote(reason)),
            other => f.write_str(other.label()),
        }
    }
}

/// Double-quote `s` using Go's escaping rules (`strconv.Quote`): short escapes
/// for the usual controls, `\xNN` for other ASCII controls, `\uNNNN` /
/// `\UNNNNNNNN` for non-printable code points beyond ASCII.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c if !is_printable(c) => {
                if (c as u32) < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", c as u32))
                } else {
                    out.push_str(&format!("\\U{:08x}", c as u32))
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// Controls plus the separators and format characters Go refuses to print raw.
fn is_printable(c: char) -> bool {
    !(c.is_control()
        || matches!(
            c,
            '\u{00ad}' | '\u{2028}' | '\u{2029}' | '\u{200b}'..='\u{200f}' | '\u{feff}'
        ))
}

/// Decide what a row's outcome means.
pub fn classify(row: &RowOutcome) -> Verdict {
    match &row.execution {
        Execution::Failed(e) => Verdict::Failed(format!("{:#}", e)),
        Execution::Skipped => Verdict::Skip,
        Execution::Executed(result) => classify_run(result),
    }
}

/// Build errors win; otherwise the first stderr event or FAIL marker.
pub fn classify_run(result: &RunResult) -> Verdict {
    if !result.errors.is_empty() {
        return Verdict::Failed(result.errors.clone());
    }

    result
        .events
        .iter()
        .find(|e| e.kind == "stderr" || e.message.contains(FAIL_MARKER))
        .map(|e| Verdict::Failed(e.message.clone()))
        .unwrap_or(Verdict::Ok)
}

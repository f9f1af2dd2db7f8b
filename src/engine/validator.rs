use anyhow::{bail, Context, Result};

use crate::config::Columns;
use crate::engine::{Execution, RowOutcome};
use crate::playground::CodeRunner;
use crate::snippet::SnippetFetcher;
use crate::source::RowSource;

/// Single-pass cursor over submission rows.
///
/// Each call to [`next`](Self::next) consumes one row and, when its URL is
/// a playground snippet, fetches and runs it before returning. Rows are
/// never processed concurrently.
pub struct RowValidator<S, F, R> {
    source: S,
    columns: Columns,
    prefixes: Vec<String>,
    fetcher: F,
    runner: R,
    done: bool,
}

impl<S, F, R> RowValidator<S, F, R>
where
    S: RowSource,
    F: SnippetFetcher,
    R: CodeRunner,
{
    pub fn new(source: S, columns: Columns, prefixes: Vec<String>, fetcher: F, runner: R) -> Self {
        Self {
            source,
            columns,
            prefixes,
            fetcher,
            runner,
            done: false,
        }
    }

    /// Advance by one row.
    ///
    /// - `Ok(None)`: no more rows (also after a fatal error)
    /// - `Err(_)`: the source failed or a row is too short for the
    ///   configured columns; iteration stops
    /// - `Ok(Some(_))`: a row was consumed, whatever its outcome
    pub async fn next(&mut self) -> Result<Option<RowOutcome>> {
        if self.done {
            return Ok(None);
        }

        let record = match self.source.read_row() {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => {
                self.done = true;
                return Err(e.context("cannot read row"));
            }
        };

        if let Err(e) = self.check_width(&record) {
            self.done = true;
            return Err(e);
        }

        let name = record[self.columns.name].clone();
        let url = record[self.columns.url].clone();
        let category = record.get(self.columns.category).cloned();

        let execution = if self.is_snippet_url(&url) {
            self.execute(&url).await
        } else {
            tracing::debug!(%name, %url, "not a playground snippet, skipping");
            Execution::Skipped
        };

        Ok(Some(RowOutcome {
            name,
            url,
            category,
            execution,
        }))
    }

    fn check_width(&self, record: &[String]) -> Result<()> {
        if record.len() <= self.columns.name {
            bail!(
                "invalid name row index {} (row has {} fields)",
                self.columns.name,
                record.len()
            );
        }
        if record.len() <= self.columns.url {
            bail!(
                "invalid url row index {} (row has {} fields)",
                self.columns.url,
                record.len()
            );
        }
        Ok(())
    }

    fn is_snippet_url(&self, url: &str) -> bool {
        !url.is_empty() && self.prefixes.iter().any(|p| url.starts_with(p.as_str()))
    }

    async fn execute(&self, url: &str) -> Execution {
        match self.fetch_and_run(url).await {
            Ok(result) => Execution::Executed(result),
            Err(e) => {
                tracing::warn!(%url, error = %format!("{:#}", e), "row failed");
                Execution::Failed(e)
            }
        }
    }

    async fn fetch_and_run(&self, url: &str) -> Result<crate::playground::RunResult> {
        let src = self.fetcher.fetch(url).await.context("cannot get src")?;
        self.runner.run(&src).await.context("cannot run src")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground::{RunEvent, RunResult};
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    const PREFIX: &str = "https://play.golang.org";

    struct Rows(VecDeque<Result<Vec<String>>>);

    impl Rows {
        fn of(rows: &[&[&str]]) -> Self {
            Self(
                rows.iter()
                    .map(|r| Ok(r.iter().map(|s| s.to_string()).collect()))
                    .collect(),
            )
        }
    }

    impl RowSource for Rows {
        fn read_row(&mut self) -> Result<Option<Vec<String>>> {
            self.0.pop_front().transpose()
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        calls: Cell<usize>,
        fail_on: Option<&'static str>,
    }

    impl SnippetFetcher for &FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_on == Some(url) {
                return Err(anyhow!("connection refused"));
            }
            Ok(format!("// {url}"))
        }
    }

    #[derive(Default)]
    struct FakeRunner {
        sources: RefCell<Vec<String>>,
        fail: bool,
    }

    impl CodeRunner for &FakeRunner {
        async fn run(&self, src: &str) -> Result<RunResult> {
            self.sources.borrow_mut().push(src.to_string());
            if self.fail {
                return Err(anyhow!("playground unavailable"));
            }
            Ok(RunResult {
                errors: String::new(),
                events: vec![RunEvent {
                    message: "hello\n".to_string(),
                    kind: "stdout".to_string(),
                    delay: 0,
                }],
            })
        }
    }

    fn columns() -> Columns {
        Columns {
            url: 2,
            name: 1,
            category: 0,
        }
    }

    fn validator<'a>(
        rows: Rows,
        fetcher: &'a FakeFetcher,
        runner: &'a FakeRunner,
    ) -> RowValidator<Rows, &'a FakeFetcher, &'a FakeRunner> {
        RowValidator::new(rows, columns(), vec![PREFIX.to_string()], fetcher, runner)
    }

    #[tokio::test]
    async fn skips_empty_and_foreign_urls_without_network() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let rows = Rows::of(&[
            &["A", "alice", ""],
            &["A", "bob", "https://example.com/p/1"],
            &["A", "carol", "http://play.golang.org/p/1"],
        ]);
        let mut v = validator(rows, &fetcher, &runner);

        for expected in ["alice", "bob", "carol"] {
            let row = v.next().await.unwrap().unwrap();
            assert_eq!(row.name, expected);
            assert!(matches!(row.execution, Execution::Skipped));
        }
        assert!(v.next().await.unwrap().is_none());
        assert_eq!(fetcher.calls.get(), 0);
        assert!(runner.sources.borrow().is_empty());
    }

    #[tokio::test]
    async fn runs_fetched_source_for_snippet_urls() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let url = "https://play.golang.org/p/abc";
        let mut v = validator(Rows::of(&[&["Go", "dave", url]]), &fetcher, &runner);

        let row = v.next().await.unwrap().unwrap();
        assert_eq!(row.name, "dave");
        assert_eq!(row.url, url);
        assert_eq!(row.category.as_deref(), Some("Go"));
        match row.execution {
            Execution::Executed(result) => assert_eq!(result.events.len(), 1),
            other => panic!("expected executed, got {other:?}"),
        }
        assert_eq!(*runner.sources.borrow(), vec![format!("// {url}")]);
    }

    #[tokio::test]
    async fn fetch_failure_is_per_row() {
        let fetcher = FakeFetcher {
            fail_on: Some("https://play.golang.org/p/bad"),
            ..Default::default()
        };
        let runner = FakeRunner::default();
        let rows = Rows::of(&[
            &["A", "erin", "https://play.golang.org/p/bad"],
            &["A", "frank", "https://play.golang.org/p/good"],
        ]);
        let mut v = validator(rows, &fetcher, &runner);

        let first = v.next().await.unwrap().unwrap();
        match first.execution {
            Execution::Failed(e) => {
                assert_eq!(format!("{:#}", e), "cannot get src: connection refused")
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let second = v.next().await.unwrap().unwrap();
        assert_eq!(second.name, "frank");
        assert!(matches!(second.execution, Execution::Executed(_)));
        assert_eq!(runner.sources.borrow().len(), 1);
    }

    #[tokio::test]
    async fn run_failure_is_per_row() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner {
            fail: true,
            ..Default::default()
        };
        let rows = Rows::of(&[
            &["A", "gina", "https://play.golang.org/p/1"],
            &["A", "hank", ""],
        ]);
        let mut v = validator(rows, &fetcher, &runner);

        match v.next().await.unwrap().unwrap().execution {
            Execution::Failed(e) => {
                assert_eq!(format!("{:#}", e), "cannot run src: playground unavailable")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(
            v.next().await.unwrap().unwrap().execution,
            Execution::Skipped
        ));
    }

    #[tokio::test]
    async fn short_row_halts_iteration() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let rows = Rows::of(&[
            &["A", "ivy", ""],
            &["A", "jack"],
            &["A", "kate", "https://play.golang.org/p/1"],
        ]);
        let mut v = validator(rows, &fetcher, &runner);

        assert!(v.next().await.unwrap().is_some());

        let err = v.next().await.unwrap_err();
        assert!(err.to_string().starts_with("invalid url row index 2"), "{err}");

        assert!(v.next().await.unwrap().is_none());
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[tokio::test]
    async fn name_column_out_of_range_is_fatal() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let mut v = RowValidator::new(
            Rows::of(&[&["A", "lena", ""]]),
            Columns {
                url: 2,
                name: 5,
                category: 0,
            },
            vec![PREFIX.to_string()],
            &fetcher,
            &runner,
        );

        let err = v.next().await.unwrap_err();
        assert!(err.to_string().starts_with("invalid name row index 5"), "{err}");
    }

    #[tokio::test]
    async fn source_error_is_fatal_with_context() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let rows = Rows(VecDeque::from(vec![
            Err(anyhow!("bad utf-8")),
            Ok(vec!["A".into(), "mia".into(), "".into()]),
        ]));
        let mut v = validator(rows, &fetcher, &runner);

        let err = v.next().await.unwrap_err();
        assert_eq!(format!("{:#}", err), "cannot read row: bad utf-8");
        assert!(v.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compile_timeout_fails_only_that_row() {
        use crate::playground::{http_client, PlaygroundClient};
        use crate::snippet::SnippetPages;
        use std::time::Duration;
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        for name in ["slow", "fast"] {
            Mock::given(method("GET"))
                .and(path(format!("/p/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    r#"<html><body><textarea id="code">package {name}</textarea></body></html>"#
                )))
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/compile"))
            .and(body_string_contains("package+slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"Errors":"","Events":[]}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/compile"))
            .and(body_string_contains("package+fast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"Errors":"","Events":[]}"#),
            )
            .mount(&server)
            .await;

        let client = http_client(1).unwrap();
        let slow = format!("{}/p/slow", server.uri());
        let fast = format!("{}/p/fast", server.uri());
        let rows = Rows::of(&[&["A", "olga", slow.as_str()], &["A", "pete", fast.as_str()]]);
        let mut v = RowValidator::new(
            rows,
            columns(),
            vec![server.uri()],
            SnippetPages::new(client.clone()),
            PlaygroundClient::new(client, &server.uri()),
        );

        let first = v.next().await.unwrap().unwrap();
        match first.execution {
            Execution::Failed(e) => {
                let reason = format!("{:#}", e);
                assert!(reason.starts_with("cannot run src:"), "{reason}");
            }
            other => panic!("expected timeout failure, got {other:?}"),
        }

        let second = v.next().await.unwrap().unwrap();
        assert_eq!(second.name, "pete");
        assert!(matches!(second.execution, Execution::Executed(_)));
        assert!(v.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn category_column_may_be_missing() {
        let fetcher = FakeFetcher::default();
        let runner = FakeRunner::default();
        let mut v = RowValidator::new(
            Rows::of(&[&["", "nina"]]),
            Columns {
                url: 0,
                name: 1,
                category: 9,
            },
            vec![PREFIX.to_string()],
            &fetcher,
            &runner,
        );

        let row = v.next().await.unwrap().unwrap();
        assert_eq!(row.category, None);
        assert!(matches!(row.execution, Execution::Skipped));
    }
}

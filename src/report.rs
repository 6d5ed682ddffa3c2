//! Run-all-and-report scenario execution.
//!
//! Each scenario runs to completion (or panic) before the next begins. A
//! failure is recorded and never stops the run.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::Duration;

use futures::FutureExt;
use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::Result;

/// Errors longer than this are truncated in the summary table.
const MAX_SUMMARY_ERROR_CHARS: usize = 200;

/// Outcome of one scenario.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Wall-clock time spent
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Collected results for a suite.
#[derive(Debug, Serialize)]
pub struct Report {
    suite: String,
    results: Vec<ScenarioResult>,
}

impl Report {
    /// Create an empty report.
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            results: Vec::new(),
        }
    }

    /// Run a scenario and record its outcome. Panics are caught and recorded
    /// as failures.
    pub async fn run<F, Fut>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        info!(scenario = %name, "Running scenario");
        let start = Instant::now();
        let outcome = AssertUnwindSafe(f()).catch_unwind().await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                Some(format!("PANIC: {msg}"))
            }
        };
        let passed = error.is_none();
        match error {
            None => info!(scenario = %name, "Scenario passed"),
            Some(ref e) => error!(scenario = %name, error = %e, "Scenario failed"),
        }
        self.record(name, passed, start.elapsed(), error);
        passed
    }

    /// Await a harness step (install, kubeconfig, connect, cleanup) and record
    /// its outcome, handing back the value on success.
    pub async fn step<T, Fut>(&mut self, name: &str, fut: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        info!(step = %name, "Running step");
        let start = Instant::now();
        let result = fut.await;
        let elapsed = start.elapsed();
        match result {
            Ok(value) => {
                self.record(name, true, elapsed, None);
                Some(value)
            }
            Err(e) => {
                error!(step = %name, error = %e, "Step failed");
                self.record(name, false, elapsed, Some(e.to_string()));
                None
            }
        }
    }

    /// Record an outcome produced outside [`Report::run`].
    pub fn record(&mut self, name: &str, passed: bool, duration: Duration, error: Option<String>) {
        self.results.push(ScenarioResult {
            name: name.to_string(),
            passed,
            duration,
            error,
        });
    }

    /// All recorded results, in run order.
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Names of failed scenarios, in run order.
    pub fn failures(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }

    /// True when nothing failed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Log the PASS/FAIL table and return a summary of failures, if any.
    pub fn finish(&self) -> std::result::Result<(), String> {
        let total: Duration = self.results.iter().map(|r| r.duration).sum();
        let failures = self.failures();
        let passed = self.results.len() - failures.len();

        info!("========================================");
        info!("  {}", self.suite.to_uppercase());
        info!("========================================");
        for r in &self.results {
            let tag = if r.passed { "PASS" } else { "FAIL" };
            info!("  {tag}  {:40} {:.1}s", r.name, r.duration.as_secs_f64());
            if let Some(ref e) = r.error {
                info!("        -> {}", truncate(e, MAX_SUMMARY_ERROR_CHARS));
            }
        }
        info!("----------------------------------------");
        info!(
            "  {} passed, {} failed ({:.1}s total)",
            passed,
            failures.len(),
            total.as_secs_f64()
        );
        info!("========================================");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "{} scenario(s) failed in {}: {}",
                failures.len(),
                self.suite,
                failures.join(", ")
            ))
        }
    }
}

impl Report {
    /// Write the results as pretty-printed JSON, for CI artifacts.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Wrote report");
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s.get(..idx).unwrap_or(s)),
        None => s.to_string(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_records_pass_and_fail() {
        let mut report = Report::new("blueprint");
        assert!(report.run("ok", || async { Ok(()) }).await);
        assert!(
            !report
                .run("bad", || async { Err(Error::invalid_selector("app=nginx")) })
                .await
        );

        assert_eq!(report.results().len(), 2);
        assert_eq!(report.failures(), vec!["bad"]);
        assert!(!report.all_passed());

        let summary = report.finish().unwrap_err();
        assert!(summary.contains("1 scenario(s) failed in blueprint: bad"));
    }

    #[tokio::test]
    async fn test_panic_is_recorded_and_run_continues() {
        let mut report = Report::new("blueprint");
        report
            .run("panics", || async {
                let secret: Option<&str> = None;
                secret.expect("secret was nil");
                Ok(())
            })
            .await;
        report.run("after", || async { Ok(()) }).await;

        let results = report.results();
        assert!(!results[0].passed);
        assert_eq!(results[0].error.as_deref(), Some("PANIC: secret was nil"));
        assert!(results[1].passed);
    }

    #[tokio::test]
    async fn test_step_returns_value_and_records() {
        let mut report = Report::new("blueprint");
        let value = report.step("connect", async { Ok(7) }).await;
        assert_eq!(value, Some(7));

        let missing: Option<()> = report
            .step("cleanup", async { Err(Error::invalid_config("no script")) })
            .await;
        assert!(missing.is_none());
        assert_eq!(report.failures(), vec!["cleanup"]);
    }

    #[test]
    fn test_empty_report_passes() {
        let report = Report::new("blueprint");
        assert!(report.all_passed());
        assert!(report.finish().is_ok());
    }

    #[tokio::test]
    async fn test_write_json() {
        let mut report = Report::new("blueprint");
        report.record("ok", true, Duration::from_millis(1500), None);
        report.record("bad", false, Duration::ZERO, Some("boom".to_string()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["suite"], "blueprint");
        assert_eq!(json["results"][0]["duration_secs"], 1.5);
        assert!(json["results"][0].get("error").is_none());
        assert_eq!(json["results"][1]["error"], "boom");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}

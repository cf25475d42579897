//! Page-scanning harness.
//!
//! Ties a [`ComplianceEngine`] to the configured compliance policy: navigate
//! to a target, scan it, then assert on the result. A page passes when no
//! issue at a configured fail level survives the ignore lists; a failing
//! page renders every failing issue into the assertion message.
//!
//! # Example
//!
//! ```no_run
//! use a11yscan::{Config, PageHarness};
//! use a11yscan::engine::BrowserEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let engine = BrowserEngine::launch(&config).await?;
//!     let harness = PageHarness::new(Box::new(engine), config);
//!
//!     let report = harness.scan("https://example.com", Some("home")).await?;
//!     assert_eq!(harness.assert_compliance(&report), 0, "{}", harness.format_failures(&report));
//!     Ok(())
//! }
//! ```

use std::path::Path;

use crate::config::Config;
use crate::engine::{ComplianceEngine, EngineError};
use crate::model::{Issue, PageReport};

/// Drives compliance scans against URLs or local HTML files.
pub struct PageHarness {
    engine: Box<dyn ComplianceEngine>,
    config: Config,
}

impl PageHarness {
    pub fn new(engine: Box<dyn ComplianceEngine>, config: Config) -> Self {
        Self { engine, config }
    }

    /// Scans one target. `target` may be an `http(s)` or `file` URL, or a
    /// path to a local HTML file. Without an explicit label, one is derived
    /// from the target.
    pub async fn scan(
        &self,
        target: &str,
        label: Option<&str>,
    ) -> Result<PageReport, EngineError> {
        let url = normalize_target(target)?;
        let label = match label {
            Some(l) => l.to_string(),
            None => derive_label(target),
        };
        tracing::debug!(%url, %label, "scanning page");
        self.engine.check(&url, &label).await
    }

    /// Issues that count against compliance: at a configured fail level and
    /// not suppressed by the ignore lists.
    pub fn failing_issues<'a>(&self, report: &'a PageReport) -> Vec<&'a Issue> {
        report
            .issues
            .iter()
            .filter(|i| self.config.fail_levels.contains(&i.level))
            .filter(|i| !self.config.ignore.should_ignore(i))
            .collect()
    }

    /// Returns the number of failing issues; zero means the page complies.
    pub fn assert_compliance(&self, report: &PageReport) -> usize {
        self.failing_issues(report).len()
    }

    /// Renders every failing issue for an assertion message, one block per
    /// issue: level, rule id, xpath, snippet.
    pub fn format_failures(&self, report: &PageReport) -> String {
        let mut out = String::from("\n");
        for issue in self.failing_issues(report) {
            out.push_str(&format!(
                "{}\n\t{}\n\t{}\n\t{}\n",
                issue.level.as_str(),
                issue.rule_id,
                issue.xpath,
                issue.snippet.as_deref().unwrap_or(""),
            ));
        }
        out
    }

    /// Releases the underlying engine.
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.engine.shutdown().await
    }
}

/// Turns a scan target into a URL the browser can open.
fn normalize_target(target: &str) -> Result<String, EngineError> {
    if target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("file://")
    {
        return Ok(target.to_string());
    }

    let path = Path::new(target).canonicalize()?;
    Ok(format!("file://{}", path.display()))
}

/// Derives a report label from a target: the file stem for paths, the
/// sanitized remainder for URLs.
fn derive_label(target: &str) -> String {
    let stripped = target
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("file://")
        .trim_end_matches('/');

    let candidate = Path::new(stripped)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| stripped.to_string());

    let label: String = candidate
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if label.is_empty() {
        "page".to_string()
    } else {
        label
    }
}

//! Run-lifecycle reporting.
//!
//! The [`Reporter`] reacts to the points of a scan run the way the host
//! harness drives them: construction initializes the run summary and the
//! metrics logger; [`page_scanned`] persists one page's report files and
//! folds its tallies into the summary; [`run_complete`] stamps the end
//! time, handles the unexpected-error path, and saves the summary file;
//! [`finish`] dispatches the notification and metrics upload.
//!
//! [`page_scanned`]: Reporter::page_scanned
//! [`run_complete`]: Reporter::run_complete
//! [`finish`]: Reporter::finish

mod html;
mod json;
mod table;

pub use json::sanitize_label;
pub use table::print_summary_table;

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::{Config, ReportFormat};
use crate::metrics::MetricsLogger;
use crate::model::{PageReport, ScanSummary};
use crate::notify::{self, WebhookNotifier};

/// Accumulates run state and persists it at each lifecycle point.
pub struct Reporter {
    config: Config,
    summary: ScanSummary,
    metrics: MetricsLogger,
    pages_scanned: usize,
}

impl Reporter {
    /// Starts a run: initializes the summary and the metrics logger.
    pub fn new(config: Config) -> Self {
        debug!("run started");
        let summary = ScanSummary::new(
            config.tool_id.clone(),
            config.policies.clone(),
            config.report_levels.clone(),
        );
        let metrics = MetricsLogger::new(
            config.tool_id.clone(),
            &config.policies,
            config.metrics_endpoint.clone(),
        );
        Self {
            config,
            summary,
            metrics,
            pages_scanned: 0,
        }
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    /// Persists one page's report files and folds its tallies into the run
    /// summary. JSON output carries only the configured report levels; the
    /// HTML report keeps the full result set.
    pub fn page_scanned(
        &mut self,
        report: &PageReport,
        elapsed: Option<Duration>,
    ) -> Result<()> {
        debug!(label = %report.label, "page scanned");

        for format in &self.config.output_format {
            match format {
                ReportFormat::Json => {
                    json::save_page_report(
                        &self.config.output_folder,
                        &report.filtered(&self.config.report_levels),
                    )?;
                }
                ReportFormat::Html => {
                    html::save_page_report(&self.config.output_folder, report)?;
                }
            }
        }

        let ignored = report
            .issues
            .iter()
            .filter(|i| self.config.ignore.should_ignore(i))
            .count() as u64;

        self.summary.add_page(report);
        self.summary.counts.ignored += ignored;
        if let Some(page) = self.summary.pages.last_mut() {
            page.counts.ignored = ignored;
        }

        if self.config.capture_scan_time {
            if let Some(elapsed) = elapsed {
                self.metrics.profile(elapsed, &report.label);
            }
        }

        self.pages_scanned += 1;
        Ok(())
    }

    /// Completes the run: stamps the end time and saves `summary.json`.
    ///
    /// An unexpected runtime error resets the summary to its start time
    /// plus the error message; the summary file is still written so the
    /// failure is on record.
    pub fn run_complete(&mut self, error: Option<String>) -> Result<PathBuf> {
        debug!("run complete");
        self.summary.finalize();

        if let Some(message) = error {
            error!("unexpected error detected: {}", message);
            self.summary.mark_errored(message);
        }

        json::save_summary(&self.config.output_folder, &self.summary)
    }

    /// Exit handling: conditional notification dispatch, then the metrics
    /// upload. Delivery failures are logged, never fatal.
    pub async fn finish(&self) {
        let errored_without_pages = self.summary.error.is_some() && self.pages_scanned == 0;

        if notify::should_notify(
            self.config.notifications.webhook.is_some(),
            self.config.notifications.local_run,
            errored_without_pages,
            notify::is_ci(),
        ) {
            if let Some(webhook) = &self.config.notifications.webhook {
                let notifier = WebhookNotifier::new(webhook.clone());
                if let Err(e) = notifier.send_summary(&self.summary).await {
                    error!("failed to send notification: {}", e);
                }
            }
        }

        if let Err(e) = self.metrics.upload(&self.config.rule_archive).await {
            warn!("failed to upload scan metrics: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Issue, Severity};
    use std::fs;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.output_folder = dir.path().to_path_buf();
        config
    }

    fn report_with(issues: Vec<Issue>) -> PageReport {
        PageReport::new(
            "home",
            "file:///tmp/home.html",
            "a11yscan",
            "latest",
            vec!["wcag_2_1".to_string()],
            issues,
        )
    }

    #[test]
    fn test_page_scanned_writes_json_by_default() {
        let dir = TempDir::new().unwrap();
        let mut reporter = Reporter::new(test_config(&dir));

        reporter
            .page_scanned(&report_with(vec![]), None)
            .unwrap();

        assert!(dir.path().join("home.json").exists());
        assert!(!dir.path().join("home.html").exists());
    }

    #[test]
    fn test_page_scanned_honors_output_formats() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.output_format = vec![ReportFormat::Json, ReportFormat::Html];
        let mut reporter = Reporter::new(config);

        reporter.page_scanned(&report_with(vec![]), None).unwrap();

        assert!(dir.path().join("home.json").exists());
        assert!(dir.path().join("home.html").exists());
    }

    #[test]
    fn test_json_report_is_filtered_to_report_levels() {
        let dir = TempDir::new().unwrap();
        let mut reporter = Reporter::new(test_config(&dir));

        let report = report_with(vec![
            Issue::new("img_alt_exists", Severity::Violation, "m", "/html[1]"),
            Issue::new("video_captions", Severity::Manual, "m", "/html[1]"),
        ]);
        reporter.page_scanned(&report, None).unwrap();

        let saved: PageReport = serde_json::from_str(
            &fs::read_to_string(dir.path().join("home.json")).unwrap(),
        )
        .unwrap();
        // Manual is outside the default report levels but still tallied
        assert_eq!(saved.issues.len(), 1);
        assert_eq!(saved.counts.manual, 1);
    }

    #[test]
    fn test_summary_accumulates_and_counts_ignored() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.ignore.rules = vec!["img_alt_exists".to_string()];
        let mut reporter = Reporter::new(config);

        let report = report_with(vec![
            Issue::new("img_alt_exists", Severity::Violation, "m", "/html[1]"),
            Issue::new("aria_role_valid", Severity::Violation, "m", "/html[1]"),
        ]);
        reporter.page_scanned(&report, None).unwrap();

        assert_eq!(reporter.summary().counts.violation, 2);
        assert_eq!(reporter.summary().counts.ignored, 1);
        assert_eq!(reporter.summary().pages[0].counts.ignored, 1);
    }

    #[test]
    fn test_run_complete_saves_summary() {
        let dir = TempDir::new().unwrap();
        let mut reporter = Reporter::new(test_config(&dir));
        reporter.page_scanned(&report_with(vec![]), None).unwrap();

        let path = reporter.run_complete(None).unwrap();
        assert_eq!(path, dir.path().join("summary.json"));

        let summary: ScanSummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(summary.pages.len(), 1);
        assert!(summary.error.is_none());
        assert!(summary.end_report.unwrap() >= summary.start_report);
    }

    #[test]
    fn test_run_complete_records_error_and_resets() {
        let dir = TempDir::new().unwrap();
        let mut reporter = Reporter::new(test_config(&dir));
        reporter.page_scanned(&report_with(vec![]), None).unwrap();

        let path = reporter
            .run_complete(Some("browser crashed".to_string()))
            .unwrap();

        let summary: ScanSummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(summary.error.as_deref(), Some("browser crashed"));
        assert!(summary.pages.is_empty());
    }

    #[test]
    fn test_profiling_respects_toggle() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.capture_scan_time = false;
        let mut reporter = Reporter::new(config);

        reporter
            .page_scanned(&report_with(vec![]), Some(Duration::from_millis(100)))
            .unwrap();
        assert_eq!(reporter.metrics.recorded(), 0);

        let dir2 = TempDir::new().unwrap();
        let mut reporter = Reporter::new(test_config(&dir2));
        reporter
            .page_scanned(&report_with(vec![]), Some(Duration::from_millis(100)))
            .unwrap();
        assert_eq!(reporter.metrics.recorded(), 1);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Issue, IssueCounts, Severity};

/// Results of scanning a single rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// Caller-supplied label identifying the page; doubles as the report
    /// file stem.
    pub label: String,
    pub url: String,
    pub scan_time: DateTime<Utc>,
    /// Identifier of the tool that produced this report.
    pub tool_id: String,
    /// Rule archive the engine was loaded from.
    pub rule_archive: String,
    pub policies: Vec<String>,
    pub issues: Vec<Issue>,
    pub counts: IssueCounts,
}

impl PageReport {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        tool_id: impl Into<String>,
        rule_archive: impl Into<String>,
        policies: Vec<String>,
        issues: Vec<Issue>,
    ) -> Self {
        let counts = IssueCounts::tally(&issues);
        Self {
            label: label.into(),
            url: url.into(),
            scan_time: Utc::now(),
            tool_id: tool_id.into(),
            rule_archive: rule_archive.into(),
            policies,
            issues,
            counts,
        }
    }

    /// Issues at the given levels, preserving engine order.
    pub fn issues_at<'a>(&'a self, levels: &'a [Severity]) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(|i| levels.contains(&i.level))
    }

    /// Copy of this report with only the issues at the given levels. The
    /// tallies still cover the full scan.
    pub fn filtered(&self, levels: &[Severity]) -> PageReport {
        let mut report = self.clone();
        report.issues.retain(|i| levels.contains(&i.level));
        report
    }
}

/// One line of the run summary: a scanned page and its tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub label: String,
    pub counts: IssueCounts,
}

/// Aggregate record for an entire run.
///
/// Created when the run starts, folded into as each page report arrives,
/// and finalized (end timestamp, optional error) when the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub tool_id: String,
    pub policies: Vec<String>,
    pub report_levels: Vec<Severity>,
    pub start_report: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_report: Option<DateTime<Utc>>,
    pub counts: IssueCounts,
    pub pages: Vec<PageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanSummary {
    pub fn new(tool_id: impl Into<String>, policies: Vec<String>, report_levels: Vec<Severity>) -> Self {
        Self {
            tool_id: tool_id.into(),
            policies,
            report_levels,
            start_report: Utc::now(),
            end_report: None,
            counts: IssueCounts::default(),
            pages: Vec::new(),
            error: None,
        }
    }

    /// Folds one page's results into the run totals.
    pub fn add_page(&mut self, report: &PageReport) {
        self.counts.add(&report.counts);
        self.pages.push(PageSummary {
            label: report.label.clone(),
            counts: report.counts,
        });
    }

    /// Stamps the end of the run. The end timestamp never precedes the start.
    pub fn finalize(&mut self) {
        let now = Utc::now();
        self.end_report = Some(now.max(self.start_report));
    }

    /// Replaces accumulated state with an error marker, keeping the start
    /// timestamp so the record still shows when the run began.
    pub fn mark_errored(&mut self, message: impl Into<String>) {
        let start = self.start_report;
        let tool_id = std::mem::take(&mut self.tool_id);
        *self = ScanSummary {
            tool_id,
            policies: Vec::new(),
            report_levels: Vec::new(),
            start_report: start,
            end_report: self.end_report,
            counts: IssueCounts::default(),
            pages: Vec::new(),
            error: Some(message.into()),
        };
    }

}

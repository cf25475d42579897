//! Run-summary notifications.
//!
//! Posts a pass/fail digest of a finished run to a Slack-compatible
//! webhook. Dispatch is gated: a webhook must be configured, the run must
//! not have died before scanning anything, and the run must either be in CI
//! or have local notifications enabled.

use anyhow::Result;
use serde::Serialize;

use crate::model::ScanSummary;

/// Posts run summaries to a Slack-compatible incoming webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Sends the summary digest to the webhook.
    pub async fn send_summary(&self, summary: &ScanSummary) -> Result<()> {
        let text = build_message(summary);
        self.client
            .post(&self.url)
            .json(&WebhookMessage { text: &text })
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("sent run-summary notification");
        Ok(())
    }
}

/// Renders the notification text for a finished run.
pub fn build_message(summary: &ScanSummary) -> String {
    if let Some(error) = &summary.error {
        return format!(
            "{}: accessibility scan run ended with an error: {}",
            summary.tool_id, error
        );
    }

    let mut lines = vec![format!(
        "{}: accessibility scan complete ({} pages, policies: {})",
        summary.tool_id,
        summary.pages.len(),
        summary.policies.join(","),
    )];
    lines.push(format!(
        "{} violations, {} potential violations, {} recommendations",
        summary.counts.violation,
        summary.counts.potential_violation,
        summary.counts.recommendation,
    ));
    if let Some(end) = summary.end_report {
        let secs = (end - summary.start_report).num_seconds();
        lines.push(format!("Finished in {}s", secs));
    }

    lines.join("\n")
}

/// True when running under a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI")
        .map(|v| !v.is_empty() && v != "false")
        .unwrap_or(false)
}

/// Dispatch policy for the run-summary notification.
///
/// No notification without a webhook, none for a run that errored before
/// scanning any page, and none for local runs unless `local_run` opts in.
pub fn should_notify(
    webhook_configured: bool,
    local_run: bool,
    errored_without_pages: bool,
    in_ci: bool,
) -> bool {
    webhook_configured && !errored_without_pages && (in_ci || local_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueCounts, PageSummary};

    fn summary_with_counts() -> ScanSummary {
        let mut summary = ScanSummary::new("a11yscan", vec!["wcag_2_1".to_string()], vec![]);
        summary.pages.push(PageSummary {
            label: "home".to_string(),
            counts: IssueCounts {
                violation: 2,
                potential_violation: 1,
                ..Default::default()
            },
        });
        summary.counts.violation = 2;
        summary.counts.potential_violation = 1;
        summary.finalize();
        summary
    }

    #[test]
    fn test_build_message_reports_counts() {
        let message = build_message(&summary_with_counts());

        assert!(message.contains("1 pages"));
        assert!(message.contains("wcag_2_1"));
        assert!(message.contains("2 violations"));
        assert!(message.contains("1 potential violations"));
    }

    #[test]
    fn test_build_message_for_errored_run() {
        let mut summary = ScanSummary::new("a11yscan", vec![], vec![]);
        summary.mark_errored("unexpected error detected");

        let message = build_message(&summary);
        assert!(message.contains("ended with an error"));
        assert!(message.contains("unexpected error detected"));
    }

    #[test]
    fn test_should_notify_requires_webhook() {
        assert!(!should_notify(false, true, false, true));
    }

    #[test]
    fn test_should_notify_skips_failed_startups() {
        assert!(!should_notify(true, true, true, true));
    }

    #[test]
    fn test_should_notify_local_gate() {
        // Local run, opt-in flag off
        assert!(!should_notify(true, false, false, false));
        // Local run, opt-in flag on
        assert!(should_notify(true, true, false, false));
        // CI run ignores the local flag
        assert!(should_notify(true, false, false, true));
    }
}

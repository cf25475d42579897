use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::cache::Cache;
use crate::config::Config;
use crate::model::{Issue, PageReport, Severity};

use super::{ArchiveClient, ComplianceEngine, EngineError};

/// Headless-Chromium scan backend.
///
/// Launches one browser for the lifetime of the engine; each [`check`]
/// opens a page, injects the engine script, evaluates a scan, and parses
/// the raw report.
///
/// [`check`]: ComplianceEngine::check
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
    script: String,
    policies: Vec<String>,
    tool_id: String,
    rule_archive: String,
}

impl BrowserEngine {
    /// Fetches the engine script and launches a headless browser.
    pub async fn launch(config: &Config) -> Result<Self, EngineError> {
        let cache = Cache::with_ttl_hours(config.cache_ttl_hours);
        let archive = ArchiveClient::new(config.rule_server.clone(), cache);
        let script = archive.fetch_script(&config.rule_archive).await?;

        let browser_config = BrowserConfig::builder()
            .build()
            .map_err(EngineError::Launch)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        // The CDP event stream must be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            script,
            policies: config.policies.clone(),
            tool_id: config.tool_id.clone(),
            rule_archive: config.rule_archive.clone(),
        })
    }
}

#[async_trait]
impl ComplianceEngine for BrowserEngine {
    fn name(&self) -> &'static str {
        "headless-chromium"
    }

    async fn check(&self, url: &str, label: &str) -> Result<PageReport, EngineError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        // Inject the engine, then scan. The report comes back as a JSON
        // string to avoid deep CDP object serialization.
        page.evaluate(self.script.as_str())
            .await
            .map_err(|e| EngineError::Evaluation(e.to_string()))?;
        let raw: String = page
            .evaluate(scan_expression(&self.policies))
            .await
            .map_err(|e| EngineError::Evaluation(e.to_string()))?
            .into_value()?;

        if let Err(e) = page.close().await {
            tracing::debug!("failed to close page: {}", e);
        }

        let raw: RawReport = serde_json::from_str(&raw)?;
        Ok(parse_report(
            raw,
            label,
            url,
            &self.tool_id,
            &self.rule_archive,
            self.policies.clone(),
        ))
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.browser
            .close()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

/// Expression evaluated in-page to run one scan.
fn scan_expression(policies: &[String]) -> String {
    let guidelines = serde_json::to_string(policies).unwrap_or_else(|_| "[]".to_string());
    format!(
        "new ace.Checker().check(document, {}).then(r => JSON.stringify(r.report))",
        guidelines
    )
}

// Raw report types for the engine's JSON output.
#[derive(Deserialize)]
struct RawReport {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    rule_id: String,
    /// `[category, outcome]` pair, e.g. `["VIOLATION", "FAIL"]`.
    #[serde(default)]
    value: Vec<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    path: RawPath,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    help: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawPath {
    #[serde(default)]
    dom: String,
}

/// Maps the engine's `[category, outcome]` pair onto an issue level.
fn level_from_value(value: &[String]) -> Severity {
    let category = value.first().map(String::as_str).unwrap_or("");
    let outcome = value.get(1).map(String::as_str).unwrap_or("");
    match (category, outcome) {
        (_, "PASS") => Severity::Pass,
        ("VIOLATION", "FAIL") => Severity::Violation,
        ("VIOLATION", "POTENTIAL") => Severity::PotentialViolation,
        ("RECOMMENDATION", "FAIL") => Severity::Recommendation,
        ("RECOMMENDATION", "POTENTIAL") => Severity::PotentialRecommendation,
        _ => Severity::Manual,
    }
}

fn parse_report(
    raw: RawReport,
    label: &str,
    url: &str,
    tool_id: &str,
    rule_archive: &str,
    policies: Vec<String>,
) -> PageReport {
    let issues = raw
        .results
        .into_iter()
        .map(|r| {
            let level = level_from_value(&r.value);
            let mut issue = Issue::new(r.rule_id, level, r.message, r.path.dom);
            if let Some(snippet) = r.snippet {
                issue = issue.with_snippet(snippet);
            }
            if let Some(help) = r.help {
                issue = issue.with_help_url(help);
            }
            issue
        })
        .collect();

    PageReport::new(label, url, tool_id, rule_archive, policies, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_expression_embeds_policies() {
        let expr = scan_expression(&["wcag_2_1".to_string(), "section_508".to_string()]);
        assert!(expr.contains(r#"["wcag_2_1","section_508"]"#));
        assert!(expr.starts_with("new ace.Checker().check(document,"));
    }

    #[test]
    fn test_level_from_value() {
        let pair = |a: &str, b: &str| vec![a.to_string(), b.to_string()];

        assert_eq!(level_from_value(&pair("VIOLATION", "FAIL")), Severity::Violation);
        assert_eq!(
            level_from_value(&pair("VIOLATION", "POTENTIAL")),
            Severity::PotentialViolation
        );
        assert_eq!(
            level_from_value(&pair("RECOMMENDATION", "FAIL")),
            Severity::Recommendation
        );
        assert_eq!(
            level_from_value(&pair("RECOMMENDATION", "POTENTIAL")),
            Severity::PotentialRecommendation
        );
        assert_eq!(level_from_value(&pair("VIOLATION", "PASS")), Severity::Pass);
        assert_eq!(level_from_value(&pair("VIOLATION", "MANUAL")), Severity::Manual);
        assert_eq!(level_from_value(&[]), Severity::Manual);
    }

    #[test]
    fn test_parse_report_maps_results() {
        let raw_json = r#"{
            "results": [
                {
                    "ruleId": "img_alt_exists",
                    "value": ["VIOLATION", "FAIL"],
                    "message": "Image is missing alternative text",
                    "path": { "dom": "/html[1]/body[1]/img[1]" },
                    "snippet": "<img src=\"logo.png\">",
                    "help": "https://example.com/rules/img_alt_exists"
                },
                {
                    "ruleId": "html_lang_exists",
                    "value": ["VIOLATION", "PASS"],
                    "message": "Page language is set",
                    "path": { "dom": "/html[1]" }
                }
            ]
        }"#;

        let raw: RawReport = serde_json::from_str(raw_json).unwrap();
        let report = parse_report(
            raw,
            "home",
            "file:///tmp/home.html",
            "a11yscan",
            "latest",
            vec!["wcag_2_1".to_string()],
        );

        assert_eq!(report.label, "home");
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.counts.violation, 1);
        assert_eq!(report.counts.pass, 1);

        let first = &report.issues[0];
        assert_eq!(first.rule_id, "img_alt_exists");
        assert_eq!(first.level, Severity::Violation);
        assert_eq!(first.xpath, "/html[1]/body[1]/img[1]");
        assert_eq!(first.snippet.as_deref(), Some("<img src=\"logo.png\">"));
    }

    #[test]
    fn test_parse_report_tolerates_empty_results() {
        let raw: RawReport = serde_json::from_str("{}").unwrap();
        let report = parse_report(raw, "blank", "about:blank", "a11yscan", "latest", vec![]);
        assert!(report.issues.is_empty());
        assert_eq!(report.counts.total(), 0);
    }
}

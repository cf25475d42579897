//! Scan-duration profiling and upload.
//!
//! When profiling is enabled, the reporter records how long each page scan
//! took. At the end of the run the accumulated durations are uploaded in one
//! batch, keyed by the rule archive the engine ran with, so rule-pack owners
//! can track scan cost per release. No endpoint configured means no upload.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

/// Collects per-page scan durations for one run.
pub struct MetricsLogger {
    client: reqwest::Client,
    endpoint: Option<String>,
    tool: String,
    policies: String,
    scan_times_ms: Vec<u64>,
}

#[derive(Serialize)]
struct MetricsPayload<'a> {
    tool: &'a str,
    policies: &'a str,
    rule_archive: &'a str,
    scan_times_ms: &'a [u64],
}

impl MetricsLogger {
    pub fn new(tool: impl Into<String>, policies: &[String], endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            tool: tool.into(),
            policies: policies.join(","),
            scan_times_ms: Vec::new(),
        }
    }

    /// Records one page's scan duration.
    pub fn profile(&mut self, elapsed: Duration, label: &str) {
        let ms = elapsed.as_millis() as u64;
        tracing::debug!(%label, ms, "profiled scan");
        self.scan_times_ms.push(ms);
    }

    pub fn recorded(&self) -> usize {
        self.scan_times_ms.len()
    }

    /// Uploads the accumulated durations as one batch.
    ///
    /// A no-op when no endpoint is configured or nothing was profiled.
    pub async fn upload(&self, rule_archive: &str) -> Result<()> {
        let endpoint = match &self.endpoint {
            Some(e) => e,
            None => {
                tracing::debug!("no metrics endpoint configured, skipping upload");
                return Ok(());
            }
        };
        if self.scan_times_ms.is_empty() {
            return Ok(());
        }

        let payload = MetricsPayload {
            tool: &self.tool,
            policies: &self.policies,
            rule_archive,
            scan_times_ms: &self.scan_times_ms,
        };

        self.client
            .post(endpoint)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(
            count = self.scan_times_ms.len(),
            rule_archive,
            "uploaded scan metrics"
        );
        Ok(())
    }
}

//! Client glue for the external accessibility rule engine.
//!
//! The actual rule evaluation lives outside this crate, in an engine script
//! published per rule-archive release. This module fetches that script,
//! injects it into a rendered page, runs a scan, and parses the engine's
//! raw report into the crate's data model.

mod archive;
mod browser;

pub use archive::ArchiveClient;
pub use browser::BrowserEngine;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::PageReport;

/// Errors from driving the rule engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to fetch rule archive '{archive}': {source}")]
    ArchiveFetch {
        archive: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("scan evaluation failed: {0}")]
    Evaluation(String),

    #[error("engine returned malformed report: {0}")]
    MalformedReport(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A scan backend that can check one rendered page for compliance.
///
/// The production implementation is [`BrowserEngine`]; tests substitute a
/// stub that returns canned reports.
#[async_trait]
pub trait ComplianceEngine: Send + Sync {
    /// Returns the human-readable name of this engine.
    fn name(&self) -> &'static str;

    /// Navigates to `url`, scans the rendered document, and returns the
    /// page report under the given label.
    async fn check(&self, url: &str, label: &str) -> Result<PageReport, EngineError>;

    /// Releases engine resources. Default is a no-op.
    async fn shutdown(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

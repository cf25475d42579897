use crate::cache::Cache;

use super::EngineError;

/// HTTP client for the rule archive server.
///
/// Engine scripts are published per archive release under
/// `<server>/archives/<archive>/js/ace.js`. Downloads are cached on disk so
/// repeated runs against the same archive don't re-fetch the script.
pub struct ArchiveClient {
    client: reqwest::Client,
    server: String,
    cache: Cache,
}

impl ArchiveClient {
    pub fn new(server: impl Into<String>, cache: Cache) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: server.into(),
            cache,
        }
    }

    /// URL of the engine script for the given archive release.
    pub fn script_url(&self, archive: &str) -> String {
        format!(
            "{}/archives/{}/js/ace.js",
            self.server.trim_end_matches('/'),
            archive
        )
    }

    /// Returns the engine script for the given archive, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ArchiveFetch`] if the download fails.
    pub async fn fetch_script(&self, archive: &str) -> Result<String, EngineError> {
        let key = format!("engine_{}", archive);
        if let Some(script) = self.cache.get::<String>(&key) {
            tracing::debug!(archive, "engine script served from cache");
            return Ok(script);
        }

        let url = self.script_url(archive);
        tracing::debug!(%url, "downloading engine script");

        let script = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| EngineError::ArchiveFetch {
                archive: archive.to_string(),
                source,
            })?
            .text()
            .await
            .map_err(|source| EngineError::ArchiveFetch {
                archive: archive.to_string(),
                source,
            })?;

        if let Err(e) = self.cache.set(&key, &script) {
            tracing::warn!("failed to cache engine script: {}", e);
        }

        Ok(script)
    }
}

//! Configuration file handling.
//!
//! This module provides loading and saving of a11yscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/a11yscan/config.toml`
//! - macOS: `~/Library/Application Support/a11yscan/config.toml`
//! - Windows: `%APPDATA%\a11yscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! policies = ["wcag_2_1"]
//! report_levels = ["violation", "potentialviolation", "recommendation"]
//! fail_levels = ["violation", "potentialviolation"]
//! output_folder = "results"
//! output_format = ["json"]
//! rule_archive = "latest"
//! capture_scan_time = true
//!
//! [notifications]
//! webhook = "https://hooks.example.com/services/T000/B000/XXXX"
//! local_run = false
//!
//! [ignore]
//! rules = ["html_lang_exists"]
//! xpaths = ["/html[1]/body[1]/footer[1]*"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::model::{Issue, Severity};

/// Application configuration.
///
/// This struct represents all configurable options for a11yscan.
/// It can be loaded from a TOML file or created with default values.
/// CLI flags override individual fields after loading.
///
/// # Example
///
/// ```no_run
/// use a11yscan::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Policies: {}", config.policies.join(","));
/// println!("Output folder: {}", config.output_folder.display());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule policies the engine evaluates against.
    ///
    /// Default: `["wcag_2_1"]`
    pub policies: Vec<String>,

    /// Issue levels written to reports.
    ///
    /// Default: violation, potentialviolation, recommendation
    pub report_levels: Vec<Severity>,

    /// Issue levels that count as a compliance failure.
    ///
    /// Default: violation, potentialviolation
    pub fail_levels: Vec<Severity>,

    /// Directory report files are written to.
    ///
    /// Default: `results`
    pub output_folder: PathBuf,

    /// Report file formats to emit per scanned page.
    ///
    /// Valid values: "json", "html"
    /// Default: `["json"]`
    pub output_format: Vec<ReportFormat>,

    /// Rule archive release the engine script is loaded from.
    ///
    /// Default: "latest"
    pub rule_archive: String,

    /// Base URL of the rule archive server.
    pub rule_server: String,

    /// Identifier stamped into reports and metrics uploads.
    pub tool_id: String,

    /// Whether to record per-page scan durations for the metrics upload.
    ///
    /// Default: true
    pub capture_scan_time: bool,

    /// How long to cache downloaded engine scripts, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Endpoint scan-duration metrics are uploaded to. No upload when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_endpoint: Option<String>,

    /// Notification settings for run summaries.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Ignore list configuration for suppressing known issues.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Where and when to send the run-summary notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Slack-compatible webhook URL. No notification when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,

    /// Also notify for runs outside a CI environment.
    ///
    /// Default: false (CI runs only)
    pub local_run: bool,
}

/// Configuration for ignoring specific rules or page regions.
///
/// Use this to suppress known false positives or accepted issues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Rule ids to suppress. Supports glob patterns (e.g., "aria_*").
    pub rules: Vec<String>,

    /// XPaths to suppress. Supports glob patterns, useful for whole
    /// page regions (e.g., "/html[1]/body[1]/footer[1]*").
    pub xpaths: Vec<String>,
}

impl IgnoreConfig {
    /// Check if an issue should be suppressed.
    pub fn should_ignore(&self, issue: &Issue) -> bool {
        self.matches_rule(&issue.rule_id) || self.matches_xpath(&issue.xpath)
    }

    fn matches_rule(&self, rule_id: &str) -> bool {
        self.rules.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, rule_id)
            } else {
                pattern == rule_id
            }
        })
    }

    fn matches_xpath(&self, xpath: &str) -> bool {
        self.xpaths.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, xpath)
            } else {
                pattern == xpath
            }
        })
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    // Check middle parts
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

/// Report file format for per-page results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            _ => Err(format!("Unknown format: {}. Use 'json' or 'html'", s)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policies: vec!["wcag_2_1".to_string()],
            report_levels: vec![
                Severity::Violation,
                Severity::PotentialViolation,
                Severity::Recommendation,
            ],
            fail_levels: vec![Severity::Violation, Severity::PotentialViolation],
            output_folder: PathBuf::from("results"),
            output_format: vec![ReportFormat::Json],
            rule_archive: "latest".to_string(),
            rule_server: "https://able.ibm.com/rules".to_string(),
            tool_id: "a11yscan".to_string(),
            capture_scan_time: true,
            cache_ttl_hours: 24,
            metrics_endpoint: None,
            notifications: NotificationConfig::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("a11yscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    ///
    /// This is useful for showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("img_alt_exists", "img_alt_exists"));
        assert!(!glob_match("img_alt_exists", "img_alt_decorative"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("aria_*", "aria_role_valid"));
        assert!(glob_match("aria_*", "aria_attribute_allowed"));
        assert!(!glob_match("aria_*", "img_alt_exists"));
    }

    #[test]
    fn test_glob_match_suffix() {
        assert!(glob_match("*_exists", "img_alt_exists"));
        assert!(glob_match("*_exists", "html_lang_exists"));
        assert!(!glob_match("*_exists", "aria_role_valid"));
    }

    #[test]
    fn test_glob_match_xpath_region() {
        assert!(glob_match(
            "/html[1]/body[1]/footer[1]*",
            "/html[1]/body[1]/footer[1]/a[2]"
        ));
        assert!(!glob_match(
            "/html[1]/body[1]/footer[1]*",
            "/html[1]/body[1]/main[1]/a[2]"
        ));
    }

    #[test]
    fn test_ignore_config_rules() {
        let config = IgnoreConfig {
            rules: vec!["html_lang_exists".to_string(), "aria_*".to_string()],
            xpaths: vec![],
        };
        let by_id = Issue::new("html_lang_exists", Severity::Violation, "m", "/html[1]");
        let by_glob = Issue::new("aria_role_valid", Severity::Violation, "m", "/html[1]");
        let kept = Issue::new("img_alt_exists", Severity::Violation, "m", "/html[1]");

        assert!(config.should_ignore(&by_id));
        assert!(config.should_ignore(&by_glob));
        assert!(!config.should_ignore(&kept));
    }

    #[test]
    fn test_ignore_config_xpaths() {
        let config = IgnoreConfig {
            rules: vec![],
            xpaths: vec!["/html[1]/body[1]/footer[1]*".to_string()],
        };
        let in_footer = Issue::new(
            "img_alt_exists",
            Severity::Violation,
            "m",
            "/html[1]/body[1]/footer[1]/img[1]",
        );
        let in_main = Issue::new(
            "img_alt_exists",
            Severity::Violation,
            "m",
            "/html[1]/body[1]/main[1]/img[1]",
        );

        assert!(config.should_ignore(&in_footer));
        assert!(!config.should_ignore(&in_main));
    }

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("HTML".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert!("sarif".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.policies, vec!["wcag_2_1".to_string()]);
        assert_eq!(config.fail_levels.len(), 2);
        assert_eq!(config.output_format, vec![ReportFormat::Json]);
        assert_eq!(config.rule_archive, "latest");
        assert!(config.capture_scan_time);
        assert!(config.notifications.webhook.is_none());
        assert!(!config.notifications.local_run);
        assert!(config.ignore.rules.is_empty());
    }

    #[test]
    fn test_config_parses_toml() {
        let toml_str = r#"
            policies = ["wcag_2_2", "section_508"]
            output_format = ["json", "html"]
            fail_levels = ["violation"]
            capture_scan_time = false

            [notifications]
            webhook = "https://hooks.example.com/T000"
            local_run = true

            [ignore]
            rules = ["html_lang_exists"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.policies.len(), 2);
        assert_eq!(
            config.output_format,
            vec![ReportFormat::Json, ReportFormat::Html]
        );
        assert_eq!(config.fail_levels, vec![Severity::Violation]);
        assert!(!config.capture_scan_time);
        assert_eq!(
            config.notifications.webhook.as_deref(),
            Some("https://hooks.example.com/T000")
        );
        assert!(config.notifications.local_run);
        assert_eq!(config.ignore.rules, vec!["html_lang_exists".to_string()]);
        // Unspecified fields fall back to defaults
        assert_eq!(config.rule_archive, "latest");
    }

    #[test]
    fn test_default_config_roundtrips() {
        let rendered = Config::generate_default_config();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.policies, Config::default().policies);
        assert_eq!(parsed.cache_ttl_hours, 24);
    }
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Issue level reported by the rule engine, from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Violation,
    PotentialViolation,
    Recommendation,
    PotentialRecommendation,
    Manual,
    Pass,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Violation => "violation",
            Severity::PotentialViolation => "potentialviolation",
            Severity::Recommendation => "recommendation",
            Severity::PotentialRecommendation => "potentialrecommendation",
            Severity::Manual => "manual",
            Severity::Pass => "pass",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Violation => "Violation",
            Severity::PotentialViolation => "Potential Violation",
            Severity::Recommendation => "Recommendation",
            Severity::PotentialRecommendation => "Potential Recommendation",
            Severity::Manual => "Needs Review",
            Severity::Pass => "Pass",
        }
    }

    /// Rank for ordering, 0 is most severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Violation => 0,
            Severity::PotentialViolation => 1,
            Severity::Recommendation => 2,
            Severity::PotentialRecommendation => 3,
            Severity::Manual => 4,
            Severity::Pass => 5,
        }
    }

    /// All levels at or above the given one, most severe first.
    pub fn at_or_above(level: Severity) -> Vec<Severity> {
        [
            Severity::Violation,
            Severity::PotentialViolation,
            Severity::Recommendation,
            Severity::PotentialRecommendation,
            Severity::Manual,
            Severity::Pass,
        ]
        .into_iter()
        .filter(|l| l.rank() <= level.rank())
        .collect()
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "violation" => Ok(Severity::Violation),
            "potentialviolation" => Ok(Severity::PotentialViolation),
            "recommendation" => Ok(Severity::Recommendation),
            "potentialrecommendation" => Ok(Severity::PotentialRecommendation),
            "manual" => Ok(Severity::Manual),
            "pass" => Ok(Severity::Pass),
            _ => Err(format!(
                "Unknown level: {}. Use 'violation', 'potentialviolation', 'recommendation', \
                 'potentialrecommendation', 'manual', or 'pass'",
                s
            )),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single finding reported by the engine for one element of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Rule identifier from the engine's rule set.
    pub rule_id: String,
    pub level: Severity,
    /// Human-readable description of what failed.
    pub message: String,
    /// XPath of the offending element.
    pub xpath: String,
    /// Markup excerpt around the offending element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

impl Issue {
    pub fn new(
        rule_id: impl Into<String>,
        level: Severity,
        message: impl Into<String>,
        xpath: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            level,
            message: message.into(),
            xpath: xpath.into(),
            snippet: None,
            help_url: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }
}

/// Per-level issue tallies for a page or an entire run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCounts {
    pub violation: u64,
    #[serde(rename = "potentialviolation")]
    pub potential_violation: u64,
    pub recommendation: u64,
    #[serde(rename = "potentialrecommendation")]
    pub potential_recommendation: u64,
    pub manual: u64,
    pub pass: u64,
    pub ignored: u64,
}

impl IssueCounts {
    /// Tallies the given issues, counting suppressed ones under `ignored`.
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.record(issue.level);
        }
        counts
    }

    pub fn record(&mut self, level: Severity) {
        match level {
            Severity::Violation => self.violation += 1,
            Severity::PotentialViolation => self.potential_violation += 1,
            Severity::Recommendation => self.recommendation += 1,
            Severity::PotentialRecommendation => self.potential_recommendation += 1,
            Severity::Manual => self.manual += 1,
            Severity::Pass => self.pass += 1,
        }
    }

    pub fn count_for(&self, level: Severity) -> u64 {
        match level {
            Severity::Violation => self.violation,
            Severity::PotentialViolation => self.potential_violation,
            Severity::Recommendation => self.recommendation,
            Severity::PotentialRecommendation => self.potential_recommendation,
            Severity::Manual => self.manual,
            Severity::Pass => self.pass,
        }
    }

    /// Folds another tally into this one.
    pub fn add(&mut self, other: &IssueCounts) {
        self.violation += other.violation;
        self.potential_violation += other.potential_violation;
        self.recommendation += other.recommendation;
        self.potential_recommendation += other.potential_recommendation;
        self.manual += other.manual;
        self.pass += other.pass;
        self.ignored += other.ignored;
    }

    /// Every finding except passes and suppressed issues.
    pub fn total(&self) -> u64 {
        self.violation
            + self.potential_violation
            + self.recommendation
            + self.potential_recommendation
            + self.manual
    }
}

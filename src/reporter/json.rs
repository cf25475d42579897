use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{PageReport, ScanSummary};

/// Converts a page label to a safe report file stem.
pub fn sanitize_label(label: &str) -> String {
    let safe: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "page".to_string()
    } else {
        safe
    }
}

/// Writes one page's report to `<folder>/<label>.json`.
pub fn save_page_report(folder: &Path, report: &PageReport) -> Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join(format!("{}.json", sanitize_label(&report.label)));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Writes the run summary to `<folder>/summary.json`.
pub fn save_summary(folder: &Path, summary: &ScanSummary) -> Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join("summary.json");
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Issue, Severity};
    use tempfile::TempDir;

    fn sample_report(label: &str) -> PageReport {
        PageReport::new(
            label,
            "file:///tmp/page.html",
            "a11yscan",
            "latest",
            vec!["wcag_2_1".to_string()],
            vec![Issue::new(
                "img_alt_exists",
                Severity::Violation,
                "Image is missing alternative text",
                "/html[1]/body[1]/img[1]",
            )],
        )
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("home"), "home");
        assert_eq!(sanitize_label("pricing/enterprise page"), "pricing_enterprise_page");
        assert_eq!(sanitize_label(""), "page");
    }

    #[test]
    fn test_save_page_report_names_file_after_label() {
        let dir = TempDir::new().unwrap();
        let path = save_page_report(dir.path(), &sample_report("home page")).unwrap();

        assert_eq!(path, dir.path().join("home_page.json"));
        let content = fs::read_to_string(&path).unwrap();
        let parsed: PageReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.label, "home page");
        assert_eq!(parsed.counts.violation, 1);
    }

    #[test]
    fn test_save_summary() {
        let dir = TempDir::new().unwrap();
        let mut summary = ScanSummary::new("a11yscan", vec!["wcag_2_1".to_string()], vec![]);
        summary.add_page(&sample_report("home"));
        summary.finalize();

        let path = save_summary(dir.path(), &summary).unwrap();
        assert_eq!(path, dir.path().join("summary.json"));

        let parsed: ScanSummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.pages.len(), 1);
        assert!(parsed.end_report.is_some());
    }

    #[test]
    fn test_save_creates_output_folder() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("results").join("run1");
        save_page_report(&nested, &sample_report("home")).unwrap();
        assert!(nested.join("home.json").exists());
    }
}

//! HTML report output format.
//!
//! Generates a self-contained per-page HTML report with styling for easy
//! viewing and sharing.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{PageReport, Severity};

use super::json::sanitize_label;

/// Writes one page's report to `<folder>/<label>.html`.
pub fn save_page_report(folder: &Path, report: &PageReport) -> Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join(format!("{}.html", sanitize_label(&report.label)));
    fs::write(&path, generate_html_string(report))?;
    Ok(path)
}

/// Generate HTML as a string (for file output)
pub fn generate_html_string(report: &PageReport) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Accessibility Report - {label}</title>
    <style>
        :root {{
            --bg-color: #1a1a2e;
            --card-bg: #16213e;
            --text-color: #eee;
            --text-muted: #888;
            --border-color: #0f3460;
            --violation: #dc3545;
            --potential: #fd7e14;
            --recommendation: #ffc107;
            --pass: #28a745;
            --accent: #0f3460;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-color);
            color: var(--text-color);
            line-height: 1.6;
            padding: 2rem;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; }}
        header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border-color);
        }}
        h1 {{ font-size: 1.75rem; font-weight: 600; }}
        .timestamp {{ color: var(--text-muted); font-size: 0.9rem; }}
        .stats {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat-card {{
            background: var(--card-bg);
            padding: 1.25rem;
            border-radius: 8px;
            border: 1px solid var(--border-color);
        }}
        .stat-value {{ font-size: 2rem; font-weight: 700; }}
        .stat-label {{ color: var(--text-muted); font-size: 0.85rem; }}
        .level-violation {{ color: var(--violation); }}
        .level-potentialviolation {{ color: var(--potential); }}
        .level-recommendation {{ color: var(--recommendation); }}
        .level-pass {{ color: var(--pass); }}
        section {{ margin-bottom: 2rem; }}
        h2 {{
            font-size: 1.25rem;
            margin-bottom: 1rem;
            padding-bottom: 0.5rem;
            border-bottom: 1px solid var(--border-color);
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            background: var(--card-bg);
            border-radius: 8px;
            overflow: hidden;
        }}
        th, td {{
            padding: 0.75rem 1rem;
            text-align: left;
            border-bottom: 1px solid var(--border-color);
        }}
        th {{ background: var(--accent); font-weight: 600; }}
        tr:hover {{ background: rgba(255,255,255,0.02); }}
        code {{
            font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
            font-size: 0.85rem;
            color: var(--text-muted);
            word-break: break-all;
        }}
        footer {{ color: var(--text-muted); font-size: 0.85rem; }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>Accessibility Report - {label}</h1>
            <span class="timestamp">{time}</span>
        </header>
        <section class="stats">
            <div class="stat-card">
                <div class="stat-value level-violation">{violations}</div>
                <div class="stat-label">Violations</div>
            </div>
            <div class="stat-card">
                <div class="stat-value level-potentialviolation">{potentials}</div>
                <div class="stat-label">Potential Violations</div>
            </div>
            <div class="stat-card">
                <div class="stat-value level-recommendation">{recommendations}</div>
                <div class="stat-label">Recommendations</div>
            </div>
            <div class="stat-card">
                <div class="stat-value level-pass">{passes}</div>
                <div class="stat-label">Passes</div>
            </div>
        </section>
"#,
        label = escape(&report.label),
        time = report.scan_time.format("%Y-%m-%d %H:%M:%S UTC"),
        violations = report.counts.violation,
        potentials = report.counts.potential_violation,
        recommendations = report.counts.recommendation,
        passes = report.counts.pass,
    ));

    let findings: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.level != Severity::Pass)
        .collect();

    if findings.is_empty() {
        html.push_str("        <section><p>No issues found.</p></section>\n");
    } else {
        html.push_str(
            r#"        <section>
            <h2>Issues</h2>
            <table>
                <tr><th>Level</th><th>Rule</th><th>Message</th><th>Element</th></tr>
"#,
        );
        for issue in findings {
            let rule = match &issue.help_url {
                Some(url) => format!(
                    r#"<a href="{}">{}</a>"#,
                    escape(url),
                    escape(&issue.rule_id)
                ),
                None => escape(&issue.rule_id),
            };
            html.push_str(&format!(
                "                <tr><td class=\"level-{}\">{}</td><td>{}</td><td>{}</td><td><code>{}</code></td></tr>\n",
                issue.level.as_str(),
                issue.level.display_name(),
                rule,
                escape(&issue.message),
                escape(&issue.xpath),
            ));
        }
        html.push_str("            </table>\n        </section>\n");
    }

    html.push_str(&format!(
        r#"        <footer>
            <p>Scanned {url} with {tool} (rule archive {archive}, policies: {policies})</p>
        </footer>
    </div>
</body>
</html>
"#,
        url = escape(&report.url),
        tool = escape(&report.tool_id),
        archive = escape(&report.rule_archive),
        policies = escape(&report.policies.join(", ")),
    ));

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

use tabled::{settings::Style, Table, Tabled};

use crate::model::ScanSummary;

#[derive(Tabled)]
struct PageRow {
    #[tabled(rename = "Page")]
    label: String,
    #[tabled(rename = "Violations")]
    violations: u64,
    #[tabled(rename = "Potential")]
    potential: u64,
    #[tabled(rename = "Recommendations")]
    recommendations: u64,
    #[tabled(rename = "Total")]
    total: u64,
}

/// Prints the run summary as a table of per-page tallies.
pub fn print_summary_table(summary: &ScanSummary) {
    println!();
    println!(
        "Scan started: {}",
        summary.start_report.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(end) = summary.end_report {
        println!("Scan finished: {}", end.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();

    if summary.pages.is_empty() {
        println!("No pages scanned.");
        return;
    }

    let rows: Vec<PageRow> = summary
        .pages
        .iter()
        .map(|p| PageRow {
            label: truncate(&p.label, 40),
            violations: p.counts.violation,
            potential: p.counts.potential_violation,
            recommendations: p.counts.recommendation,
            total: p.counts.total(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    println!(
        "{} pages scanned: {} violations, {} potential violations, {} recommendations",
        summary.pages.len(),
        summary.counts.violation,
        summary.counts.potential_violation,
        summary.counts.recommendation,
    );
    if summary.counts.ignored > 0 {
        println!("{} issues suppressed by ignore lists", summary.counts.ignored);
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        format!("{}...", &text[..max.saturating_sub(3)])
    }
}

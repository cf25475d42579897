use a11yscan::{
    cache::Cache,
    config::Config,
    engine::BrowserEngine,
    harness::PageHarness,
    model::{PageReport, Severity},
    reporter::{print_summary_table, Reporter},
};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VIOLATION: u8 = 2;
    pub const POTENTIAL_VIOLATION: u8 = 3;
    pub const RECOMMENDATION: u8 = 4;
}

#[derive(Parser)]
#[command(name = "a11yscan")]
#[command(
    author,
    version,
    about = "Scan rendered web pages for accessibility compliance"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan pages and write compliance reports
    Scan {
        /// URLs, HTML files, or directories to scan (directories are
        /// walked for *.html)
        targets: Vec<String>,

        /// Policies to evaluate against (overrides config)
        #[arg(short, long)]
        policy: Vec<String>,

        /// Report formats to write (json, html; overrides config)
        #[arg(short, long)]
        format: Vec<String>,

        /// Directory report files are written to (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// Report label for the page (single target only)
        #[arg(short, long)]
        label: Option<String>,

        /// Exit with an error if issues at or above this level are found
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,

        /// Scan targets sequentially instead of concurrently
        #[arg(long)]
        no_parallel: bool,

        /// Clear cached engine scripts before scanning
        #[arg(long)]
        clear_cache: bool,
    },

    /// List recognized policy identifiers
    ListPolicies,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear cached engine scripts
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    Violation,
    PotentialViolation,
    Recommendation,
}

impl FailLevel {
    fn severity(self) -> Severity {
        match self {
            FailLevel::Violation => Severity::Violation,
            FailLevel::PotentialViolation => Severity::PotentialViolation,
            FailLevel::Recommendation => Severity::Recommendation,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            targets,
            policy,
            format,
            output,
            label,
            fail_on,
            no_parallel,
            clear_cache,
        } => {
            if clear_cache {
                let cache = Cache::new();
                cache.clear()?;
            }

            let mut config = config;
            if !policy.is_empty() {
                config.policies = policy;
            }
            if !format.is_empty() {
                config.output_format = format
                    .iter()
                    .map(|f| f.parse().map_err(|e: String| anyhow::anyhow!(e)))
                    .collect::<Result<Vec<_>>>()?;
            }
            if let Some(output) = output {
                config.output_folder = output.into();
            }
            if let Some(level) = fail_on {
                config.fail_levels = Severity::at_or_above(level.severity());
            }

            run_scan(config, targets, label, !no_parallel).await
        }
        Commands::ListPolicies => {
            list_policies();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache = Cache::new();
            cache.clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    config: Config,
    targets: Vec<String>,
    label: Option<String>,
    parallel: bool,
) -> Result<u8> {
    let targets = expand_targets(&targets);
    if targets.is_empty() {
        anyhow::bail!("no scan targets found. Pass URLs, HTML files, or directories");
    }
    let label = if targets.len() == 1 { label } else { None };

    let engine = BrowserEngine::launch(&config).await?;
    let mut harness = PageHarness::new(Box::new(engine), config.clone());
    let mut reporter = Reporter::new(config);

    // Scan pages (concurrently or sequentially)
    let outcomes = if parallel && targets.len() > 1 {
        scan_concurrent(&harness, &targets).await
    } else {
        scan_sequential(&harness, &targets, label.as_deref()).await
    };

    let mut run_error = None;
    let mut scan_failures = 0usize;
    let mut failing = a11yscan::IssueCounts::default();
    for (target, outcome, elapsed) in outcomes {
        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                warn!("scan failed for {}: {}", target, e);
                scan_failures += 1;
                continue;
            }
        };

        let page_failures = harness.assert_compliance(&report);
        if page_failures > 0 {
            println!(
                "{}: {} issues failed compliance{}",
                report.label,
                page_failures,
                harness.format_failures(&report)
            );
        }
        for issue in harness.failing_issues(&report) {
            failing.record(issue.level);
        }

        if let Err(e) = reporter.page_scanned(&report, Some(elapsed)) {
            // Report emission failed; record it and stop writing reports.
            run_error = Some(e.to_string());
            break;
        }
    }

    if run_error.is_none() && scan_failures == targets.len() {
        run_error = Some("no target could be scanned".to_string());
    }

    if let Err(e) = harness.shutdown().await {
        warn!("failed to shut down browser: {}", e);
    }

    let errored = run_error.is_some();
    reporter.run_complete(run_error)?;
    if !errored {
        print_summary_table(reporter.summary());
    }
    reporter.finish().await;

    if errored {
        return Ok(exit_codes::ERROR);
    }
    Ok(determine_exit_code(&failing))
}

/// Scan all targets concurrently over the shared browser
async fn scan_concurrent(
    harness: &PageHarness,
    targets: &[String],
) -> Vec<(String, Result<PageReport, a11yscan::engine::EngineError>, Duration)> {
    let progress = progress_bar(targets.len());

    let futures: Vec<_> = targets
        .iter()
        .map(|target| {
            let pb = progress.clone();
            async move {
                let started = Instant::now();
                let result = harness.scan(target, None).await;
                pb.inc(1);
                (target.clone(), result, started.elapsed())
            }
        })
        .collect();

    let results = futures::future::join_all(futures).await;
    progress.finish_with_message(format!("Scanned {} pages", results.len()));
    results
}

/// Scan targets one at a time (original behavior)
async fn scan_sequential(
    harness: &PageHarness,
    targets: &[String],
    label: Option<&str>,
) -> Vec<(String, Result<PageReport, a11yscan::engine::EngineError>, Duration)> {
    let progress = progress_bar(targets.len());
    let mut results = Vec::new();

    for target in targets {
        progress.set_message(format!("Scanning {}...", target));
        let started = Instant::now();
        let result = harness.scan(target, label).await;
        results.push((target.clone(), result, started.elapsed()));
        progress.inc(1);
    }

    progress.finish_with_message(format!("Scanned {} pages", results.len()));
    results
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Expands CLI targets: URLs pass through, directories are walked for HTML
/// files, missing paths are dropped with a warning.
fn expand_targets(targets: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();

    for target in targets {
        if target.starts_with("http://")
            || target.starts_with("https://")
            || target.starts_with("file://")
        {
            expanded.push(target.clone());
            continue;
        }

        let path = Path::new(target);
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_html(entry.path()) {
                    expanded.push(entry.path().display().to_string());
                }
            }
        } else if path.is_file() {
            expanded.push(target.clone());
        } else {
            warn!("skipping target {}: not a URL or existing path", target);
        }
    }

    expanded
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html") | Some("htm")
    )
}

/// Determine the exit code from the issues that failed compliance
fn determine_exit_code(failing: &a11yscan::IssueCounts) -> u8 {
    if failing.violation > 0 {
        exit_codes::VIOLATION
    } else if failing.potential_violation > 0 {
        exit_codes::POTENTIAL_VIOLATION
    } else if failing.recommendation > 0 {
        exit_codes::RECOMMENDATION
    } else {
        exit_codes::SUCCESS
    }
}

fn list_policies() {
    println!("Recognized policies:");
    println!();

    let policies = [
        ("wcag_2_0", "WCAG 2.0 Level AA"),
        ("wcag_2_1", "WCAG 2.1 Level AA (default)"),
        ("wcag_2_2", "WCAG 2.2 Level AA"),
        ("section_508", "US Section 508 (revised)"),
        ("en_501_349", "EN 301 549 Level AA"),
    ];

    for (id, name) in policies {
        println!("  {:<14} {}", id, name);
    }
    println!();
    println!("Pass one or more with --policy, or set them in the config file.");
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'a11yscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

//! CLI command definition and handler

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::analysis::{roles::RoleClassifier, AnalysisEngine, CancelToken};
use crate::cochange;
use crate::config;
use crate::models::Severity;
use crate::report::{self, OutputFormat};
use crate::source::adapter::JsonModelAdapter;
use crate::source::builder::SourceModelBuilder;

/// Clean run: no violation at or above the severity threshold.
pub const EXIT_CLEAN: i32 = 0;
/// Violations at or above the severity threshold exist.
pub const EXIT_VIOLATIONS: i32 = 1;
/// Invocation or configuration error; no report produced.
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// One or more units unparseable under --strict-parse.
pub const EXIT_STRICT_PARSE: i32 = 3;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Cogload - cognitive load and cohesion analysis
///
/// 100% LOCAL - No account needed. No data leaves your machine.
#[derive(Parser, Debug)]
#[command(name = "cogload")]
#[command(
    version,
    about = "Cognitive load and cohesion analysis — role-aware score ceilings, graph-partitioned cohesion, and responsibility drift detection",
    long_about = "Cogload scores every method of a structural code model against a fixed \
cognitive load rubric, enforces role-specific ceilings, partitions each unit's \
member/method usage graph to surface extraction boundaries, and optionally folds \
in co-change history to flag scattered responsibilities.\n\n\
The structural model is supplied by per-ecosystem front-ends as JSON model files; \
cogload itself is language-agnostic and stateless between runs.",
    after_help = "\
Examples:
  cogload model/                         Analyze all model files in a directory
  cogload a.json b.json --format json    JSON output for scripting
  cogload model/ --config cogload.toml   Custom thresholds and severities
  cogload model/ --severity-threshold warning   Fail CI on warnings too
  cogload model/ --co-change-source history.ndjson   Enable shotgun-surgery detection
  cogload model/ --strict-parse          Unparseable units become fatal (exit 3)

Exit codes:
  0  clean run
  1  violations at/above the severity threshold
  2  invocation or configuration error
  3  unparseable units under --strict-parse"
)]
pub struct Cli {
    /// Directories or model files to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Configuration file (TOML or JSON): thresholds, cohesion floor,
    /// severities, policies
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ecosystem-specific role-marker mapping (TOML or JSON)
    #[arg(long)]
    pub role_marker_map: Option<PathBuf>,

    /// Newline-delimited JSON co-change records {unit, timestamp}
    #[arg(long)]
    pub co_change_source: Option<PathBuf>,

    /// Minimum severity causing a non-zero exit
    #[arg(long, value_parser = ["info", "warning", "error"])]
    pub severity_threshold: Option<String>,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Treat unparseable units as fatal (exit 3)
    #[arg(long)]
    pub strict_parse: bool,

    /// Number of parallel workers (1-64)
    #[arg(long, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

/// Run the analysis and return the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    let format = OutputFormat::from_str(&cli.format)?;

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(level) = &cli.severity_threshold {
        let threshold = Severity::from_str(level).map_err(anyhow::Error::msg)?;
        config.severity_threshold = Some(threshold);
    }
    let marker_map = config::load_marker_map(cli.role_marker_map.as_deref())?;

    let cochange_records = match &cli.co_change_source {
        Some(path) => Some(cochange::load_records(path)?),
        None => None,
    };

    let mut builder = SourceModelBuilder::new(
        Box::new(JsonModelAdapter::new()),
        config.policies.stream_counting,
    )
    .with_workers(cli.workers);

    // Progress bar over file parsing; text mode only, drawn to stderr
    if format == OutputFormat::Text {
        let bar = ProgressBar::new(0).with_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("parsing");
        builder = builder.with_progress(Box::new(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
            if done == total {
                bar.finish_and_clear();
            }
        }));
    }

    let cancel = CancelToken::new();
    let outcome = builder.build(&cli.paths, &cancel)?;
    debug!(
        "graph built: {} unit(s), {} skipped",
        outcome.graph.len(),
        outcome.skipped.len()
    );

    let engine = AnalysisEngine::new(config, RoleClassifier::new(marker_map))
        .with_workers(cli.workers);
    let report = engine.run(
        &outcome.graph,
        cochange_records.as_deref(),
        outcome.skipped,
        &cancel,
    )?;

    let mut rendered = report::render(&report, format)?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    match &cli.output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    let has_parse_failures = report
        .skipped_units
        .iter()
        .any(|s| s.reason == crate::models::SkipReason::ParseError);

    if cli.strict_parse && has_parse_failures {
        return Ok(EXIT_STRICT_PARSE);
    }
    if !report.clean {
        return Ok(EXIT_VIOLATIONS);
    }
    Ok(EXIT_CLEAN)
}

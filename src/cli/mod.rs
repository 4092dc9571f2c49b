//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `mlboard analyze` — run the analysis flow on pasted/file results
//! - `mlboard summarize` — run the summary flow on name + metrics + viz notes
//! - `mlboard compare` — merge two experiment JSON files for comparison
//! - `mlboard health` — check provider config and reachability
//! - `mlboard stats` — flow invocation log summary

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::analytics;
use crate::compare::{self, Experiment};
use crate::flows::{self, FlowError};
use crate::llm::gemini::GeminiClient;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// mlboard analyze
// ---------------------------------------------------------------------------

/// Run the analysis flow and print the structured result.
///
/// `results` is taken verbatim; `results_file`, when given, wins and is read
/// from disk.
pub fn run_analyze(
    client: &GeminiClient,
    results: Option<&str>,
    results_file: Option<&Path>,
    query: &str,
    format: OutputFormat,
) -> Result<()> {
    let results = match (results_file, results) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text.to_string(),
        (None, None) => bail!("provide experiment results via --results or --results-file"),
    };

    let start = Instant::now();
    let outcome = flows::run_analysis(client, &results, query);
    let latency_ms = start.elapsed().as_millis() as u64;
    log_outcome("analyze", &outcome, latency_ms);

    let result = outcome?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            print_section("Analysis", &result.analysis);
            print_section("Insights", &result.insights);
            print_section("Statistical Significance", &result.statistical_significance);
            print_section("Robustness", &result.robustness_assessment);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// mlboard summarize
// ---------------------------------------------------------------------------

/// Run the summary flow and print the result.
///
/// Metrics arrive as `name=value` pairs from the command line.
pub fn run_summarize(
    client: &GeminiClient,
    name: &str,
    metric_args: &[String],
    visualization_data: &str,
    format: OutputFormat,
) -> Result<()> {
    let metrics = parse_metrics(metric_args)?;

    let start = Instant::now();
    let outcome = flows::run_summary(client, name, metrics, visualization_data);
    let latency_ms = start.elapsed().as_millis() as u64;
    log_outcome("summary", &outcome, latency_ms);

    let result = outcome?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            print_section("Summary", &result.summary);
            println!("{}", "Key Findings".bold().cyan());
            for finding in &result.key_findings {
                println!("  - {finding}");
            }
        }
    }

    Ok(())
}

/// Parse `name=value` metric arguments into a map.
fn parse_metrics(args: &[String]) -> Result<BTreeMap<String, f64>> {
    let mut metrics = BTreeMap::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("metric {arg:?} is not in name=value form");
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("metric {name:?} has a non-numeric value {value:?}"))?;
        metrics.insert(name.to_string(), value);
    }
    Ok(metrics)
}

// ---------------------------------------------------------------------------
// mlboard compare
// ---------------------------------------------------------------------------

/// Merge two experiment JSON files and print the comparison.
pub fn run_compare(first: &Path, second: &Path, format: OutputFormat) -> Result<()> {
    let first = load_experiment(first)?;
    let second = load_experiment(second)?;

    let chart = compare::merge_chart_data(&first, &second);
    let metrics = compare::metric_comparison(&first, &second);

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "chartData": chart, "metrics": metrics });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!(
                "{} {} vs {}",
                "Comparing".bold().cyan(),
                first.name,
                second.name
            );
            println!();
            println!("  {:<16} {:>12} {:>12}", "Metric", truncate(&first.id, 12), truncate(&second.id, 12));
            println!("  {}", "-".repeat(42));
            for row in &metrics {
                println!("  {:<16} {:>12.4} {:>12.4}", row.name, row.first, row.second);
            }
            println!();
            println!("{} {} epochs merged", "Chart:".bold(), chart.len());
        }
    }

    Ok(())
}

fn load_experiment(path: &Path) -> Result<Experiment> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid experiment file", path.display()))
}

// ---------------------------------------------------------------------------
// mlboard health
// ---------------------------------------------------------------------------

/// Check provider config and reachability.
pub fn run_health(client: &GeminiClient) -> Result<()> {
    println!("{}", "mlboard health".bold().cyan());
    println!();

    println!("  {} {}", "Model:".bold(), client.model_name());

    if client.has_api_key() {
        println!("  {} {}", "API key:".bold(), "set".green());
    } else {
        println!(
            "  {} {} (set MLBOARD_API_KEY or GEMINI_API_KEY)",
            "API key:".bold(),
            "missing".red()
        );
        return Ok(());
    }

    if client.is_healthy() {
        println!("  {} {}", "Provider:".bold(), "reachable".green());
    } else {
        println!("  {} {}", "Provider:".bold(), "unreachable".red());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// mlboard stats
// ---------------------------------------------------------------------------

/// Show flow invocation statistics from the JSONL log.
pub fn run_stats(format: OutputFormat) -> Result<()> {
    let report = analytics::compute_stats();

    if report.analyze.invocations == 0 && report.summary.invocations == 0 {
        println!("{}", "No invocations logged yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("{}", "Flow Invocations".bold().cyan());
            println!(
                "  {:<10} {:>6} {:>6} {:>11} {:>11} {:>9}",
                "Flow", "Total", "OK", "Validation", "Invocation", "Avg ms"
            );
            println!("  {}", "-".repeat(58));
            for (name, stats) in [("analyze", &report.analyze), ("summary", &report.summary)] {
                println!(
                    "  {:<10} {:>6} {:>6} {:>11} {:>11} {:>9}",
                    name,
                    stats.invocations,
                    stats.successes,
                    stats.validation_errors,
                    stats.invocation_errors,
                    stats.avg_latency_ms,
                );
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn log_outcome<T>(flow: &str, outcome: &Result<T, FlowError>, latency_ms: u64) {
    match outcome {
        Ok(_) => analytics::log_flow_event(flow, true, None, latency_ms),
        Err(err) => {
            let kind = if err.is_validation() {
                "validation"
            } else {
                "invocation"
            };
            analytics::log_flow_event(flow, false, Some(kind), latency_ms);
        }
    }
}

fn print_section(title: &str, body: &str) {
    println!("{}", title.bold().cyan());
    println!("{body}");
    println!();
}

/// Shorten a label to at most `max` characters, ellipsis included.
/// Counts chars, not bytes, so multi-byte ids never split mid-character.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

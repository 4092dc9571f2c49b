//! Flow invocation log.
//!
//! Callers (CLI, web handlers) append one JSONL entry per flow invocation to
//! `~/.mlboard/flow-log.jsonl` — the flow executor itself never logs. Used
//! by `mlboard stats` and the dashboard's `/api/stats` endpoint.
//!
//! Logging is best-effort: failures are silently ignored so a read-only home
//! directory never breaks a flow.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// A single flow invocation record. One line per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub timestamp: String,
    /// Flow name: `"analyze"` or `"summary"`.
    pub flow: String,
    pub success: bool,
    /// Error kind on failure: `"validation"` or `"invocation"`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    /// Wall-clock latency of the invocation in milliseconds.
    pub latency_ms: u64,
}

/// Log a flow invocation result. Best-effort.
///
/// No-op under unit test: handler tests drive the full flow plumbing and
/// must not write into the real home directory of whoever runs them.
pub fn log_flow_event(flow: &str, success: bool, error_kind: Option<&str>, latency_ms: u64) {
    if cfg!(test) {
        return;
    }

    let event = FlowEvent {
        timestamp: Utc::now().to_rfc3339(),
        flow: flow.to_string(),
        success,
        error_kind: error_kind.map(|s| s.to_string()),
        latency_ms,
    };
    let Some(path) = flow_log_path() else {
        return;
    };
    let _ = append_event(&path, &event);
}

fn append_event(path: &Path, event: &FlowEvent) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the flow log file.
pub fn flow_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mlboard").join("flow-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Reading & aggregation
// ---------------------------------------------------------------------------

/// Read all flow events, silently skipping malformed lines. Empty if the
/// file doesn't exist.
pub fn read_all_events() -> Vec<FlowEvent> {
    let Some(path) = flow_log_path() else {
        return Vec::new();
    };
    read_events_from(&path)
}

fn read_events_from(path: &Path) -> Vec<FlowEvent> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<FlowEvent>(&line).ok())
        .collect()
}

/// Aggregated invocation statistics for one flow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowStats {
    pub invocations: usize,
    pub successes: usize,
    pub validation_errors: usize,
    pub invocation_errors: usize,
    pub avg_latency_ms: u64,
}

/// Full stats report across both flows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsReport {
    pub analyze: FlowStats,
    pub summary: FlowStats,
}

/// Aggregate a set of events into per-flow statistics.
pub fn aggregate(events: &[FlowEvent]) -> StatsReport {
    let mut report = StatsReport::default();

    for event in events {
        let stats = match event.flow.as_str() {
            "analyze" => &mut report.analyze,
            "summary" => &mut report.summary,
            _ => continue,
        };

        stats.invocations += 1;
        if event.success {
            stats.successes += 1;
        } else {
            match event.error_kind.as_deref() {
                Some("validation") => stats.validation_errors += 1,
                _ => stats.invocation_errors += 1,
            }
        }
        // Running total; divided below.
        stats.avg_latency_ms += event.latency_ms;
    }

    for stats in [&mut report.analyze, &mut report.summary] {
        if stats.invocations > 0 {
            stats.avg_latency_ms /= stats.invocations as u64;
        }
    }

    report
}

/// Convenience: read the log and aggregate it.
pub fn compute_stats() -> StatsReport {
    aggregate(&read_all_events())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(flow: &str, success: bool, error_kind: Option<&str>, latency_ms: u64) -> FlowEvent {
        FlowEvent {
            timestamp: Utc::now().to_rfc3339(),
            flow: flow.to_string(),
            success,
            error_kind: error_kind.map(|s| s.to_string()),
            latency_ms,
        }
    }

    #[test]
    fn aggregate_counts_per_flow() {
        let events = vec![
            event("analyze", true, None, 100),
            event("analyze", false, Some("validation"), 0),
            event("summary", true, None, 300),
            event("summary", false, Some("invocation"), 50),
            event("unknown", true, None, 1),
        ];

        let report = aggregate(&events);
        assert_eq!(report.analyze.invocations, 2);
        assert_eq!(report.analyze.successes, 1);
        assert_eq!(report.analyze.validation_errors, 1);
        assert_eq!(report.summary.invocation_errors, 1);
        assert_eq!(report.summary.avg_latency_ms, 175);
    }

    #[test]
    fn aggregate_of_nothing_is_zeroes() {
        let report = aggregate(&[]);
        assert_eq!(report.analyze.invocations, 0);
        assert_eq!(report.summary.avg_latency_ms, 0);
    }

    #[test]
    fn append_and_read_against_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow-log.jsonl");

        append_event(&path, &event("analyze", true, None, 120)).unwrap();
        append_event(&path, &event("summary", false, Some("validation"), 5)).unwrap();

        let events = read_events_from(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].flow, "analyze");
        assert_eq!(events[1].error_kind.as_deref(), Some("validation"));
    }

    #[test]
    fn read_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow-log.jsonl");

        append_event(&path, &event("analyze", true, None, 1)).unwrap();
        fs::write(
            &path,
            format!("{}\nnot json\n", fs::read_to_string(&path).unwrap().trim()),
        )
        .unwrap();

        let events = read_events_from(&path);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn log_flow_event_is_inert_under_test() {
        // Exercises the public entry point; the cfg!(test) gate keeps it
        // from touching the home directory of whoever runs the suite.
        log_flow_event("analyze", true, None, 1);
        log_flow_event("summary", false, Some("invocation"), 1);
    }

    #[test]
    fn event_round_trips_through_jsonl() {
        let e = event("analyze", false, Some("invocation"), 42);
        let line = serde_json::to_string(&e).unwrap();
        let back: FlowEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(back.flow, "analyze");
        assert_eq!(back.error_kind.as_deref(), Some("invocation"));
        assert_eq!(back.latency_ms, 42);
    }

    #[test]
    fn error_kind_is_omitted_on_success() {
        let e = event("summary", true, None, 10);
        let line = serde_json::to_string(&e).unwrap();
        assert!(!line.contains("error_kind"));
    }
}

//! Experiment comparison — the view-state merge behind the comparison charts.
//!
//! Two experiments are compared on two axes:
//!
//! - **Training curves**: their per-epoch series are zipped into one combined
//!   series, each column keyed `{experiment_id}_{metric}` so both lines can
//!   be drawn on a single chart.
//! - **Final metrics**: the union of their metric names, side by side, with
//!   a missing metric defaulting to zero.
//!
//! These are pure functions over immutable value objects; no flow or network
//! involvement.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

/// A parameter value — hyperparameters mix numbers and names (e.g.
/// `learning_rate: 0.001`, `optimizer: "Adam"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

/// One recorded point of a training run: the epoch plus whatever metrics
/// were logged at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub epoch: u32,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
}

/// A finished experiment as the dashboard sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub date: String,
    /// Final metric values (accuracy, precision, loss, ...).
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// Per-epoch training series, in epoch order.
    #[serde(default)]
    pub chart_data: Vec<ChartPoint>,
}

// ---------------------------------------------------------------------------
// Merged outputs
// ---------------------------------------------------------------------------

/// One row of the combined training chart. Columns are keyed
/// `{experiment_id}_{metric}` and flattened into the row on serialization.
#[derive(Debug, Clone, Serialize)]
pub struct MergedPoint {
    pub epoch: u32,
    #[serde(flatten)]
    pub series: BTreeMap<String, f64>,
}

/// One row of the side-by-side metrics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    /// Metric name, title-cased for display.
    pub name: String,
    pub first: f64,
    pub second: f64,
}

/// Zip the training series of two experiments into one combined series.
///
/// The combined series spans the longer of the two runs, epochs numbered
/// from 1. An experiment that has no point (or no value for a metric) at a
/// given epoch simply contributes nothing to that row — short runs are not
/// padded.
pub fn merge_chart_data(first: &Experiment, second: &Experiment) -> Vec<MergedPoint> {
    let epochs = first.chart_data.len().max(second.chart_data.len());

    (0..epochs)
        .map(|i| {
            let mut series = BTreeMap::new();
            for exp in [first, second] {
                if let Some(point) = exp.chart_data.get(i) {
                    for (metric, value) in &point.metrics {
                        series.insert(format!("{}_{}", exp.id, metric), *value);
                    }
                }
            }
            MergedPoint {
                epoch: (i + 1) as u32,
                series,
            }
        })
        .collect()
}

/// Build side-by-side rows over the union of both experiments' final metrics.
///
/// Loss is excluded — it lives on a different scale than the 0..1 rate
/// metrics and would flatten the shared axis. A metric missing from one
/// experiment defaults to 0.0. Rows come out in sorted metric-name order.
pub fn metric_comparison(first: &Experiment, second: &Experiment) -> Vec<MetricRow> {
    let names: BTreeSet<&String> = first.metrics.keys().chain(second.metrics.keys()).collect();

    names
        .into_iter()
        .filter(|name| name.as_str() != "loss")
        .map(|name| MetricRow {
            name: title_case(name),
            first: first.metrics.get(name).copied().unwrap_or(0.0),
            second: second.metrics.get(name).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Uppercase the first character for display (`accuracy` → `Accuracy`).
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(id: &str, points: &[(u32, f64, f64)]) -> Experiment {
        Experiment {
            id: id.to_string(),
            name: format!("Experiment {id}"),
            date: "2023-11-01".to_string(),
            metrics: BTreeMap::new(),
            params: BTreeMap::new(),
            chart_data: points
                .iter()
                .map(|(epoch, accuracy, loss)| ChartPoint {
                    epoch: *epoch,
                    metrics: BTreeMap::from([
                        ("accuracy".to_string(), *accuracy),
                        ("loss".to_string(), *loss),
                    ]),
                })
                .collect(),
        }
    }

    #[test]
    fn merge_keys_columns_by_experiment_id() {
        let a = experiment("exp1", &[(1, 0.6, 0.5), (2, 0.7, 0.4)]);
        let b = experiment("exp2", &[(1, 0.55, 0.6), (2, 0.65, 0.5)]);

        let merged = merge_chart_data(&a, &b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].epoch, 1);
        assert_eq!(merged[0].series["exp1_accuracy"], 0.6);
        assert_eq!(merged[0].series["exp2_loss"], 0.6);
        assert_eq!(merged[1].series["exp2_accuracy"], 0.65);
    }

    #[test]
    fn merge_spans_the_longer_run() {
        let a = experiment("exp1", &[(1, 0.6, 0.5)]);
        let b = experiment("exp2", &[(1, 0.5, 0.6), (2, 0.6, 0.5), (3, 0.7, 0.4)]);

        let merged = merge_chart_data(&a, &b);
        assert_eq!(merged.len(), 3);
        // The short run contributes nothing past its end.
        assert!(!merged[1].series.contains_key("exp1_accuracy"));
        assert_eq!(merged[2].epoch, 3);
        assert_eq!(merged[2].series["exp2_accuracy"], 0.7);
    }

    #[test]
    fn merge_of_two_empty_runs_is_empty() {
        let a = experiment("exp1", &[]);
        let b = experiment("exp2", &[]);
        assert!(merge_chart_data(&a, &b).is_empty());
    }

    #[test]
    fn merge_keeps_explicit_zero_values() {
        let mut a = experiment("exp1", &[]);
        a.chart_data.push(ChartPoint {
            epoch: 1,
            metrics: BTreeMap::from([("loss".to_string(), 0.0)]),
        });
        let b = experiment("exp2", &[]);

        let merged = merge_chart_data(&a, &b);
        assert_eq!(merged[0].series["exp1_loss"], 0.0);
    }

    #[test]
    fn comparison_defaults_missing_metrics_to_zero() {
        let mut a = experiment("exp1", &[]);
        a.metrics = BTreeMap::from([
            ("accuracy".to_string(), 0.85),
            ("precision".to_string(), 0.82),
        ]);
        let mut b = experiment("exp2", &[]);
        b.metrics = BTreeMap::from([
            ("accuracy".to_string(), 0.82),
            ("recall".to_string(), 0.88),
        ]);

        let rows = metric_comparison(&a, &b);
        assert_eq!(
            rows,
            vec![
                MetricRow {
                    name: "Accuracy".to_string(),
                    first: 0.85,
                    second: 0.82
                },
                MetricRow {
                    name: "Precision".to_string(),
                    first: 0.82,
                    second: 0.0
                },
                MetricRow {
                    name: "Recall".to_string(),
                    first: 0.0,
                    second: 0.88
                },
            ]
        );
    }

    #[test]
    fn comparison_excludes_loss() {
        let mut a = experiment("exp1", &[]);
        a.metrics = BTreeMap::from([
            ("accuracy".to_string(), 0.85),
            ("loss".to_string(), 0.35),
        ]);
        let mut b = experiment("exp2", &[]);
        b.metrics = BTreeMap::from([("loss".to_string(), 0.4)]);

        let rows = metric_comparison(&a, &b);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Accuracy");
    }

    #[test]
    fn experiment_round_trips_through_json() {
        let json = r#"{
            "id": "exp1",
            "name": "ResNet50 - Adam",
            "date": "2023-11-01",
            "metrics": { "accuracy": 0.85, "loss": 0.35 },
            "params": { "learning_rate": 0.001, "optimizer": "Adam" },
            "chartData": [ { "epoch": 1, "accuracy": 0.6, "loss": 0.5 } ]
        }"#;
        let exp: Experiment = serde_json::from_str(json).unwrap();
        assert_eq!(exp.chart_data.len(), 1);
        assert_eq!(exp.chart_data[0].metrics["accuracy"], 0.6);
        assert!(matches!(exp.params["optimizer"], ParamValue::Text(_)));
        assert!(matches!(exp.params["learning_rate"], ParamValue::Number(_)));
    }
}

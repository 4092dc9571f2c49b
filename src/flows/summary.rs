//! Experiment-summary flow.
//!
//! Condenses an experiment's name, metric map, and visualization notes into
//! a prose summary plus an ordered list of key findings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FlowError, execute};
use crate::llm::ModelClient;
use crate::llm::prompts::render_summary_prompt;
use crate::schema::{FieldSpec, FieldType, Schema};

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub const SUMMARY_INPUT: Schema = Schema::new(
    "SummaryRequest",
    &[
        FieldSpec {
            name: "experimentName",
            ty: FieldType::Text,
            description: "The name of the experiment.",
        },
        FieldSpec {
            name: "metrics",
            ty: FieldType::NumberMap,
            description: "A record of metrics for the experiment.",
        },
        FieldSpec {
            name: "visualizationData",
            ty: FieldType::Text,
            description: "Data for visualizations related to the experiment.",
        },
    ],
);

pub const SUMMARY_OUTPUT: Schema = Schema::new(
    "SummaryResult",
    &[
        FieldSpec {
            name: "summary",
            ty: FieldType::Text,
            description: "A summary of the experiment insights.",
        },
        FieldSpec {
            name: "keyFindings",
            ty: FieldType::TextList,
            description: "Key findings from the experiment.",
        },
    ],
);

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Input to the summary flow.
///
/// Metrics live in a `BTreeMap` so prompt rendering sees them in a stable
/// order. The map may be empty; `visualization_data` may not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub experiment_name: String,
    pub metrics: BTreeMap<String, f64>,
    pub visualization_data: String,
}

/// Typed, schema-validated result of the summary flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub summary: String,
    /// Ordered as the model produced them.
    pub key_findings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the summary flow for the given experiment details.
pub fn run_summary(
    client: &dyn ModelClient,
    experiment_name: &str,
    metrics: BTreeMap<String, f64>,
    visualization_data: &str,
) -> Result<SummaryResult, FlowError> {
    let request = SummaryRequest {
        experiment_name: experiment_name.to_string(),
        metrics,
        visualization_data: visualization_data.to_string(),
    };
    run_summary_request(client, &request)
}

/// Run the summary flow for an already-built request.
pub fn run_summary_request(
    client: &dyn ModelClient,
    request: &SummaryRequest,
) -> Result<SummaryResult, FlowError> {
    execute(client, &SUMMARY_INPUT, &SUMMARY_OUTPUT, request, |req| {
        render_summary_prompt(&req.experiment_name, &req.metrics, &req.visualization_data)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_to_schema_field_names() {
        let request = SummaryRequest {
            experiment_name: "Exp1".to_string(),
            metrics: BTreeMap::from([("accuracy".to_string(), 0.92)]),
            visualization_data: "line chart".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(SUMMARY_INPUT.validate(&value).is_ok());
        assert_eq!(value["experimentName"], "Exp1");
        assert_eq!(value["metrics"]["accuracy"], 0.92);
    }

    #[test]
    fn empty_metrics_map_passes_input_validation() {
        let value = json!({
            "experimentName": "Exp1",
            "metrics": {},
            "visualizationData": "bar chart",
        });
        assert!(SUMMARY_INPUT.validate(&value).is_ok());
    }

    #[test]
    fn empty_visualization_data_fails_input_validation() {
        let value = json!({
            "experimentName": "Exp1",
            "metrics": {},
            "visualizationData": "",
        });
        let err = SUMMARY_INPUT.validate(&value).unwrap_err();
        assert!(err.cites("visualizationData"));
    }

    #[test]
    fn result_deserializes_from_schema_shaped_reply() {
        let reply = json!({
            "summary": "went well",
            "keyFindings": ["a", "b"],
        });
        assert!(SUMMARY_OUTPUT.validate(&reply).is_ok());
        let result: SummaryResult = serde_json::from_value(reply).unwrap();
        assert_eq!(result.key_findings.len(), 2);
    }
}

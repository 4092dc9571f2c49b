//! Experiment-analysis flow.
//!
//! Takes a free-form dump of experiment results (metrics, logs, config —
//! whatever the user pastes) plus a question about them, and returns a
//! structured analysis including statistical-significance and robustness
//! assessments.

use serde::{Deserialize, Serialize};

use super::{FlowError, execute};
use crate::llm::ModelClient;
use crate::llm::prompts::render_analysis_prompt;
use crate::schema::{FieldSpec, FieldType, Schema};

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub const ANALYSIS_INPUT: Schema = Schema::new(
    "AnalysisRequest",
    &[
        FieldSpec {
            name: "experimentResults",
            ty: FieldType::Text,
            description:
                "The experiment results data, including metrics and any relevant visualizations.",
        },
        FieldSpec {
            name: "query",
            ty: FieldType::Text,
            description: "The specific question or analysis request.",
        },
    ],
);

pub const ANALYSIS_OUTPUT: Schema = Schema::new(
    "AnalysisResult",
    &[
        FieldSpec {
            name: "analysis",
            ty: FieldType::Text,
            description: "The AI analysis of the experiment results.",
        },
        FieldSpec {
            name: "insights",
            ty: FieldType::Text,
            description: "Key insights and suggestions for improvement.",
        },
        FieldSpec {
            name: "statisticalSignificance",
            ty: FieldType::Text,
            description: "Assessment of the statistical significance of the results.",
        },
        FieldSpec {
            name: "robustnessAssessment",
            ty: FieldType::Text,
            description: "Assessment of the robustness of the model.",
        },
    ],
);

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Input to the analysis flow. Immutable value object, one per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub experiment_results: String,
    pub query: String,
}

/// Typed, schema-validated result of the analysis flow. All four fields are
/// required; a reply missing any one never makes it past validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    pub insights: String,
    pub statistical_significance: String,
    pub robustness_assessment: String,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the analysis flow for the given results and query.
pub fn run_analysis(
    client: &dyn ModelClient,
    experiment_results: &str,
    query: &str,
) -> Result<AnalysisResult, FlowError> {
    let request = AnalysisRequest {
        experiment_results: experiment_results.to_string(),
        query: query.to_string(),
    };
    run_analysis_request(client, &request)
}

/// Run the analysis flow for an already-built request.
pub fn run_analysis_request(
    client: &dyn ModelClient,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, FlowError> {
    execute(client, &ANALYSIS_INPUT, &ANALYSIS_OUTPUT, request, |req| {
        render_analysis_prompt(&req.experiment_results, &req.query)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

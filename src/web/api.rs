//! JSON API handlers.
//!
//! Each handler returns an [`ApiReply`] (status code + JSON body) so it can
//! be unit-tested without a running server. Error mapping:
//!
//! - malformed request body → 400
//! - flow validation failure → 422, with the offending fields listed
//! - provider invocation failure → 502, opaque message
//!
//! Handlers log a [`crate::analytics`] event per flow invocation; the flow
//! executor itself stays silent.

use std::time::Instant;

use serde_json::{Value, json};

use crate::analytics;
use crate::compare::{self, Experiment};
use crate::flows::analyze::{ANALYSIS_INPUT, AnalysisRequest, run_analysis_request};
use crate::flows::summary::{SUMMARY_INPUT, SummaryRequest, run_summary_request};
use crate::flows::FlowError;
use crate::llm::ModelClient;
use crate::llm::gemini::GeminiClient;
use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Reply type
// ---------------------------------------------------------------------------

/// A handler's reply: HTTP status plus a JSON body.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: 400,
            body: json!({ "error": message }),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: json!({ "error": "not found" }),
        }
    }

    fn from_flow_error(err: &FlowError) -> Self {
        match err {
            FlowError::Validation(v) => Self {
                status: 422,
                body: json!({
                    "error": v.to_string(),
                    "schema": v.schema,
                    "fields": v.issues.iter().map(|i| json!({
                        "field": i.field,
                        "expected": i.expected.to_string(),
                        "problem": i.problem.to_string(),
                    })).collect::<Vec<_>>(),
                }),
            },
            FlowError::Invocation(e) => Self {
                status: 502,
                body: json!({ "error": e.to_string() }),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Flow endpoints
// ---------------------------------------------------------------------------

/// `POST /api/analyze` — run the analysis flow.
pub fn post_analyze(client: &dyn ModelClient, body: &str) -> ApiReply {
    run_flow(client, body, "analyze", &ANALYSIS_INPUT, |client, value| {
        let request: AnalysisRequest = serde_json::from_value(value)?;
        let result = run_analysis_request(client, &request)?;
        Ok(serde_json::to_value(result)?)
    })
}

/// `POST /api/summarize` — run the summary flow.
pub fn post_summarize(client: &dyn ModelClient, body: &str) -> ApiReply {
    run_flow(client, body, "summary", &SUMMARY_INPUT, |client, value| {
        let request: SummaryRequest = serde_json::from_value(value)?;
        let result = run_summary_request(client, &request)?;
        Ok(serde_json::to_value(result)?)
    })
}

/// Shared request plumbing for both flow endpoints: parse, pre-validate
/// against the input schema (so a missing field is a 422 naming it, not an
/// opaque deserialization 400), run, log.
fn run_flow(
    client: &dyn ModelClient,
    body: &str,
    flow: &str,
    input_schema: &Schema,
    run: impl FnOnce(&dyn ModelClient, Value) -> anyhow::Result<Value>,
) -> ApiReply {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return ApiReply::bad_request("request body is not valid JSON"),
    };

    if let Err(err) = input_schema.validate(&value) {
        analytics::log_flow_event(flow, false, Some("validation"), 0);
        return ApiReply::from_flow_error(&FlowError::Validation(err));
    }

    let start = Instant::now();
    let outcome = run(client, value);
    let latency_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            analytics::log_flow_event(flow, true, None, latency_ms);
            ApiReply::ok(result)
        }
        Err(err) => match err.downcast::<FlowError>() {
            Ok(flow_err) => {
                let kind = if flow_err.is_validation() {
                    "validation"
                } else {
                    "invocation"
                };
                analytics::log_flow_event(flow, false, Some(kind), latency_ms);
                ApiReply::from_flow_error(&flow_err)
            }
            Err(other) => {
                analytics::log_flow_event(flow, false, Some("invocation"), latency_ms);
                ApiReply {
                    status: 502,
                    body: json!({ "error": other.to_string() }),
                }
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Comparison endpoint
// ---------------------------------------------------------------------------

/// `POST /api/compare` — merge two experiments for the comparison view.
///
/// Body: `{ "first": Experiment, "second": Experiment }`.
pub fn post_compare(body: &str) -> ApiReply {
    #[derive(serde::Deserialize)]
    struct CompareBody {
        first: Experiment,
        second: Experiment,
    }

    let parsed: CompareBody = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => return ApiReply::bad_request(&format!("invalid compare body: {e}")),
    };

    let chart = compare::merge_chart_data(&parsed.first, &parsed.second);
    let metrics = compare::metric_comparison(&parsed.first, &parsed.second);

    ApiReply::ok(json!({
        "chartData": chart,
        "metrics": metrics,
    }))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// `GET /api/health` — config and provider reachability.
pub fn get_health(client: &GeminiClient) -> ApiReply {
    let api_key_set = client.has_api_key();
    let reachable = api_key_set && client.is_healthy();

    ApiReply::ok(json!({
        "model": client.model_name(),
        "apiKeySet": api_key_set,
        "providerReachable": reachable,
    }))
}

/// `GET /api/stats` — flow invocation log summary.
pub fn get_stats() -> ApiReply {
    let report = analytics::compute_stats();
    match serde_json::to_value(&report) {
        Ok(body) => ApiReply::ok(body),
        Err(e) => ApiReply {
            status: 500,
            body: json!({ "error": e.to_string() }),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub provider: counts calls, returns a canned reply.
    struct StubClient {
        calls: AtomicUsize,
        reply: Value,
    }

    impl StubClient {
        fn returning(reply: Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ModelClient for StubClient {
        fn generate(&self, _prompt: &str, _schema: &Schema) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn analyze_returns_result_on_success() {
        let stub = StubClient::returning(json!({
            "analysis": "a", "insights": "i",
            "statisticalSignificance": "s", "robustnessAssessment": "r",
        }));
        let body = json!({
            "experimentResults": "accuracy=0.9",
            "query": "Is this overfitting?",
        })
        .to_string();

        let reply = post_analyze(&stub, &body);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["analysis"], "a");
        assert_eq!(stub.call_count(), 1);
    }

    #[test]
    fn analyze_missing_field_is_422_and_no_provider_call() {
        let stub = StubClient::returning(json!({}));
        let body = json!({ "query": "Is this overfitting?" }).to_string();

        let reply = post_analyze(&stub, &body);
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body["fields"][0]["field"], "experimentResults");
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn analyze_non_json_body_is_400() {
        let stub = StubClient::returning(json!({}));
        let reply = post_analyze(&stub, "not json at all");
        assert_eq!(reply.status, 400);
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn summarize_malformed_reply_is_422() {
        // Reply missing keyFindings
        let stub = StubClient::returning(json!({ "summary": "s" }));
        let body = json!({
            "experimentName": "Exp1",
            "metrics": { "accuracy": 0.92 },
            "visualizationData": "line chart",
        })
        .to_string();

        let reply = post_summarize(&stub, &body);
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body["schema"], "SummaryResult");
        assert_eq!(stub.call_count(), 1);
    }

    #[test]
    fn provider_failure_is_502() {
        struct FailingClient;
        impl ModelClient for FailingClient {
            fn generate(&self, _: &str, _: &Schema) -> anyhow::Result<Value> {
                anyhow::bail!("connection refused")
            }
        }

        let body = json!({
            "experimentResults": "accuracy=0.9",
            "query": "why?",
        })
        .to_string();

        let reply = post_analyze(&FailingClient, &body);
        assert_eq!(reply.status, 502);
        assert!(reply.body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[test]
    fn compare_merges_two_experiments() {
        let body = json!({
            "first": {
                "id": "exp1", "name": "A", "date": "2023-11-01",
                "metrics": { "accuracy": 0.85 },
                "chartData": [ { "epoch": 1, "accuracy": 0.6 } ],
            },
            "second": {
                "id": "exp2", "name": "B", "date": "2023-11-05",
                "metrics": { "accuracy": 0.82, "recall": 0.88 },
                "chartData": [ { "epoch": 1, "accuracy": 0.55 }, { "epoch": 2, "accuracy": 0.6 } ],
            },
        })
        .to_string();

        let reply = post_compare(&body);
        assert_eq!(reply.status, 200);
        let chart = reply.body["chartData"].as_array().unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0]["exp1_accuracy"], 0.6);
        assert_eq!(chart[1]["exp2_accuracy"], 0.6);
        // Missing recall on exp1 defaults to zero in the metrics table.
        let metrics = reply.body["metrics"].as_array().unwrap();
        assert_eq!(metrics[1]["name"], "Recall");
        assert_eq!(metrics[1]["first"], 0.0);
    }

    #[test]
    fn compare_rejects_malformed_body() {
        let reply = post_compare(r#"{ "first": 7 }"#);
        assert_eq!(reply.status, 400);
    }
}

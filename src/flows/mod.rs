//! Flow executors — the orchestration layer of the crate.
//!
//! A flow is one request/response round-trip against the model provider:
//!
//! 1. Validate the request against its input schema. On failure, return a
//!    [`FlowError::Validation`] and make **no** network call.
//! 2. Render the prompt from the validated fields.
//! 3. Invoke the injected [`ModelClient`] with the prompt and the declared
//!    output schema.
//! 4. Validate the provider's reply against the output schema. A reply
//!    missing any required field is a validation failure, never a partially
//!    populated result.
//! 5. Deserialize into the typed result.
//!
//! There is no retry, no fallback model, and no partial result. Each
//! invocation is a single blocking call with no shared mutable state;
//! concurrent invocations from different threads are independent.
//!
//! The executor itself performs no logging — recovery and reporting belong
//! to the caller (CLI, web handler).

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::llm::ModelClient;
use crate::schema::{Schema, ValidationError};

pub mod analyze;
pub mod summary;

pub use analyze::{AnalysisRequest, AnalysisResult, run_analysis};
pub use summary::{SummaryRequest, SummaryResult, run_summary};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The two ways a flow can fail.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Input or provider reply did not match its declared schema. Always
    /// recoverable: fix the input, or treat the malformed reply as a failed
    /// attempt.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The external call itself failed: network, provider-side error, or a
    /// reply that wasn't parseable at all. Surfaced verbatim, no retry.
    #[error("model invocation failed: {0}")]
    Invocation(anyhow::Error),
}

impl FlowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// ---------------------------------------------------------------------------
// Generic executor
// ---------------------------------------------------------------------------

/// Run one flow invocation end to end.
///
/// Generic over the request/result pair; the per-flow modules supply the
/// schemas and the prompt renderer. `Pending → Completed | Failed` is the
/// whole lifecycle — no cancellation once the call is issued, no streaming.
pub(crate) fn execute<I, O>(
    client: &dyn ModelClient,
    input_schema: &Schema,
    output_schema: &Schema,
    request: &I,
    render: impl FnOnce(&I) -> String,
) -> Result<O, FlowError>
where
    I: Serialize,
    O: DeserializeOwned,
{
    let candidate = serde_json::to_value(request)
        .map_err(|e| FlowError::Invocation(anyhow::Error::new(e).context("request serialization")))?;
    input_schema.validate(&candidate)?;

    let prompt = render(request);

    let reply = client
        .generate(&prompt, output_schema)
        .map_err(FlowError::Invocation)?;

    output_schema.validate(&reply)?;

    // The typed structs mirror the schema constants exactly, so this only
    // fails if the two drift apart.
    serde_json::from_value(reply).map_err(|e| {
        FlowError::Invocation(
            anyhow::Error::new(e).context("schema-valid reply failed typed deserialization"),
        )
    })
}

/// Gemini (Generative Language API) client.
///
/// Talks to `generativelanguage.googleapis.com` using the synchronous `ureq`
/// HTTP client. Provides:
///
/// - **Health check**: verify the endpoint is reachable and lists models.
/// - **Structured generation**: send a prompt plus a response schema and
///   receive JSON shaped like that schema.
///
/// Structured output uses the API's native `responseMimeType` +
/// `responseSchema` generation config, so the reply arrives as a JSON
/// document rather than prose we'd have to scrape. The declared [`Schema`]
/// is converted to the provider's OpenAPI-flavored schema dialect, field
/// descriptions included.
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ModelClient;
use super::config::LlmConfig;
use crate::schema::{FieldType, Schema};

/// Sampling temperature for both flows. Low but non-zero: analysis prose
/// benefits from some variation, field shapes are pinned by the schema.
const TEMPERATURE: f32 = 0.2;

// ---------------------------------------------------------------------------
// Request / response types for the generateContent endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Generation options included in the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: Value,
}

/// Response body from `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Response body from `GET /v1beta/models` — lists available models.
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[allow(dead_code)]
    name: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous Gemini HTTP client.
///
/// Built once from the resolved config at startup and shared (by reference)
/// across both flows and however many invocations the caller makes. Holds no
/// mutable state.
#[derive(Debug)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Whether an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Check whether the provider endpoint is reachable and lists models.
    ///
    /// Uses a short timeout (5 s) so `health` doesn't stall on a dead
    /// endpoint.
    pub fn is_healthy(&self) -> bool {
        let Some(key) = self.api_key.as_deref() else {
            return false;
        };

        let url = format!("{}/v1beta/models", self.base_url);
        let result = ureq::get(&url)
            .set("x-goog-api-key", key)
            .timeout(Duration::from_secs(5))
            .call();

        match result {
            Ok(resp) => resp
                .into_json::<ModelsResponse>()
                .map(|models| !models.models.is_empty())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Return the model name for logging.
    pub fn model_name(&self) -> &str {
        &self.model
    }
}

impl ModelClient for GeminiClient {
    /// Send a prompt and return the provider's schema-shaped JSON reply.
    ///
    /// The reply is parsed but not validated — the flow executor checks it
    /// against the output schema. Every failure here (missing key, network,
    /// provider error, unparseable reply) is an invocation error.
    fn generate(&self, prompt: &str, output_schema: &Schema) -> Result<Value> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no API key configured (set MLBOARD_API_KEY or GEMINI_API_KEY)"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
                response_schema: response_schema_for(output_schema),
            },
        };

        let resp = ureq::post(&url)
            .set("x-goog-api-key", key)
            .timeout(self.timeout)
            .send_json(&body)
            .context("Gemini generateContent request failed")?;

        let parsed: GenerateResponse = resp
            .into_json()
            .context("failed to parse Gemini response body")?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("Gemini returned no candidates"))?;

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty reply");
        }

        serde_json::from_str(text).context("Gemini reply is not valid JSON")
    }
}

// ---------------------------------------------------------------------------
// Schema conversion
// ---------------------------------------------------------------------------

/// Convert a declared output [`Schema`] into the provider's `responseSchema`
/// dialect. All declared fields are required; descriptions travel along so
/// the model knows what belongs where.
fn response_schema_for(schema: &Schema) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    let mut ordering = Vec::new();

    for field in schema.fields {
        properties.insert(field.name.to_string(), field_schema(field.ty, field.description));
        required.push(Value::String(field.name.to_string()));
        ordering.push(Value::String(field.name.to_string()));
    }

    serde_json::json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
        "propertyOrdering": ordering,
    })
}

fn field_schema(ty: FieldType, description: &str) -> Value {
    match ty {
        FieldType::Text => serde_json::json!({
            "type": "STRING",
            "description": description,
        }),
        FieldType::Number => serde_json::json!({
            "type": "NUMBER",
            "description": description,
        }),
        // Free-keyed maps have no exact equivalent in the provider dialect;
        // a plain OBJECT lets the model emit arbitrary metric names.
        FieldType::NumberMap => serde_json::json!({
            "type": "OBJECT",
            "description": description,
        }),
        FieldType::TextList => serde_json::json!({
            "type": "ARRAY",
            "items": { "type": "STRING" },
            "description": description,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

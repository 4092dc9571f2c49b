//! External model provider integration.
//!
//! The rest of the crate talks to the provider through the [`ModelClient`]
//! trait: hand it a rendered prompt and the schema the reply must match, get
//! back a parsed JSON value (or a transport/provider error). The one
//! production implementation is [`gemini::GeminiClient`]; tests substitute a
//! stub.
//!
//! The client is constructed once at startup and passed explicitly to each
//! flow invocation. Nothing in this crate holds a module-level singleton.

use anyhow::Result;
use serde_json::Value;

use crate::schema::Schema;

pub mod config;
pub mod gemini;
pub mod prompts;

/// A structured-output model provider.
///
/// `generate` sends a single prompt and asks the provider to shape its reply
/// like `output_schema`. The returned value is parsed JSON but **not yet
/// validated** — schema validation of the reply is the flow executor's job.
///
/// Errors from this trait are invocation errors: network failures, provider
/// rejections, timeouts, and replies that aren't parseable JSON at all.
pub trait ModelClient {
    fn generate(&self, prompt: &str, output_schema: &Schema) -> Result<Value>;
}

//! mlboard — backend for an ML experiment dashboard.
//!
//! The core is a pair of request/response pipelines ("flows") that wrap an
//! external LLM provider:
//!
//! - **analyze** — free-text experiment results + a question, answered with a
//!   structured analysis (significance and robustness assessments included).
//! - **summary** — experiment name, metrics, and visualization notes,
//!   condensed into a prose summary plus key findings.
//!
//! Each flow validates its input against a declarative [`schema::Schema`],
//! renders a prompt, invokes the injected [`llm::ModelClient`], and validates
//! the provider's structured reply before returning a typed result. The
//! [`compare`] module carries the chart-merging logic used by the comparison
//! view, and [`web`] exposes everything over a small JSON API.

pub mod analytics;
pub mod cli;
pub mod compare;
pub mod flows;
pub mod llm;
pub mod schema;
pub mod web;

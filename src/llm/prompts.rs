//! Prompt templates for the two insight flows.
//!
//! Each template embeds the validated request fields at fixed positions in a
//! natural-language instruction block. Rendering is pure and deterministic:
//! the same request always produces a byte-identical prompt.
//!
//! Field values are embedded **verbatim** — no escaping, no delimiter
//! protection, no truncation. Experiment results routinely contain log
//! excerpts, config dumps, and metric tables; mangling them would hurt the
//! analysis more than prompt-injection hygiene would help a single-user
//! dashboard. Callers that need isolation must sanitize before invoking.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Analysis flow
// ---------------------------------------------------------------------------

/// Render the prompt for the experiment-analysis flow.
pub fn render_analysis_prompt(experiment_results: &str, query: &str) -> String {
    format!(
        "You are an expert data scientist specializing in analyzing machine \
         learning experiment results.\n\
         \n\
         You will use the provided experiment results data and the user's \
         query to provide a comprehensive analysis. Include an assessment of \
         the statistical significance and robustness of the results. Provide \
         key insights and suggestions for improvement.\n\
         \n\
         Experiment Results:\n\
         {experiment_results}\n\
         \n\
         Query: {query}"
    )
}

// ---------------------------------------------------------------------------
// Summary flow
// ---------------------------------------------------------------------------

/// Render the prompt for the experiment-summary flow.
///
/// Metrics are rendered one per line in sorted name order so that rendering
/// stays deterministic regardless of how the map was built.
pub fn render_summary_prompt(
    experiment_name: &str,
    metrics: &BTreeMap<String, f64>,
    visualization_data: &str,
) -> String {
    format!(
        "You are an AI assistant helping data scientists summarize experiment \
         results.\n\
         \n\
         Given the following experiment details, generate a concise summary \
         of the experiment insights and highlight the key findings.\n\
         \n\
         Experiment Name: {experiment_name}\n\
         Metrics:\n\
         {metrics}\n\
         Visualization Data: {visualization_data}",
        metrics = render_metrics(metrics),
    )
}

/// Format a metric map as indented `name: value` lines.
///
/// An empty map renders as a single `(none)` line rather than nothing, so the
/// model doesn't mistake the following section header for a metric.
fn render_metrics(metrics: &BTreeMap<String, f64>) -> String {
    if metrics.is_empty() {
        return "  (none)".to_string();
    }
    metrics
        .iter()
        .map(|(name, value)| format!("  {name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_embeds_fields_verbatim() {
        let results = "accuracy=0.9, loss=0.1\nepoch 10/10";
        let query = "Is this overfitting?";
        let prompt = render_analysis_prompt(results, query);
        assert!(prompt.contains(results));
        assert!(prompt.contains(query));
    }

    #[test]
    fn analysis_prompt_is_deterministic() {
        let a = render_analysis_prompt("results", "question");
        let b = render_analysis_prompt("results", "question");
        assert_eq!(a, b);
    }

    #[test]
    fn analysis_prompt_passes_template_like_text_through() {
        // Embedded text that looks like a template stays untouched.
        let results = "{{{experimentResults}}} {weird} {{braces}}";
        let prompt = render_analysis_prompt(results, "q");
        assert!(prompt.contains("{{{experimentResults}}} {weird} {{braces}}"));
    }

    #[test]
    fn summary_prompt_embeds_all_sections() {
        let metrics = BTreeMap::from([
            ("accuracy".to_string(), 0.92),
            ("loss".to_string(), 0.15),
        ]);
        let prompt = render_summary_prompt("Exp1", &metrics, "line chart of accuracy");
        assert!(prompt.contains("Experiment Name: Exp1"));
        assert!(prompt.contains("accuracy: 0.92"));
        assert!(prompt.contains("loss: 0.15"));
        assert!(prompt.contains("Visualization Data: line chart of accuracy"));
    }

    #[test]
    fn summary_metrics_render_in_sorted_order() {
        let metrics = BTreeMap::from([
            ("recall".to_string(), 0.9),
            ("accuracy".to_string(), 0.8),
            ("f1".to_string(), 0.85),
        ]);
        let rendered = render_metrics(&metrics);
        let accuracy_pos = rendered.find("accuracy").unwrap();
        let f1_pos = rendered.find("f1").unwrap();
        let recall_pos = rendered.find("recall").unwrap();
        assert!(accuracy_pos < f1_pos);
        assert!(f1_pos < recall_pos);
    }

    #[test]
    fn summary_empty_metrics_render_placeholder() {
        let prompt = render_summary_prompt("Exp1", &BTreeMap::new(), "viz");
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn large_input_is_not_truncated() {
        let big = "x".repeat(100_000);
        let prompt = render_analysis_prompt(&big, "q");
        assert!(prompt.contains(&big));
    }
}

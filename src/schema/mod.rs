//! Declarative field schemas for flow inputs and outputs.
//!
//! Each flow declares the shape of its request and of the reply it expects
//! from the model as a flat list of named fields with semantic types. A single
//! generic validator interprets the declarations — there is no per-field
//! validation code anywhere else in the crate.
//!
//! Validation is purely structural: a field is present and has the declared
//! type, or it doesn't. Nothing checks that a `query` is actually a question
//! or that a metric value is a plausible accuracy number.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Field declarations
// ---------------------------------------------------------------------------

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free-form text. Must be non-empty after trimming — an empty required
    /// text field is treated the same as a missing one.
    Text,
    /// A single numeric value.
    Number,
    /// Mapping of metric name to numeric value. May be empty: the comparison
    /// view defaults absent metrics to zero, so an empty map is meaningful.
    NumberMap,
    /// Ordered list of text entries. May be empty.
    TextList,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::NumberMap => write!(f, "map of text to number"),
            Self::TextList => write!(f, "list of text"),
        }
    }
}

/// A single declared field: name, semantic type, and a human-readable
/// description. Descriptions are forwarded to the provider as part of the
/// structured-output schema so the model knows what belongs in each field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub description: &'static str,
}

/// A named set of field declarations describing one request or reply shape.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Schema name used in error messages (e.g. `"AnalysisRequest"`).
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// What went wrong with one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    WrongType,
    Empty,
}

impl std::fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::WrongType => write!(f, "wrong type"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// One offending field with its expected type.
#[derive(Debug, Clone)]
pub struct FieldIssue {
    pub field: String,
    pub expected: FieldType,
    pub problem: FieldProblem,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, expected {})",
            self.field, self.problem, self.expected
        )
    }
}

/// A candidate value did not match its declared schema.
///
/// Collects every offending field, not just the first, so the caller can
/// report all problems in one pass.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Name of the schema the candidate was checked against.
    pub schema: &'static str,
    pub issues: Vec<FieldIssue>,
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let issues: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{} validation failed: {}", self.schema, issues.join(", "))
    }
}

impl ValidationError {
    /// True if `field` is among the offending fields.
    pub fn cites(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

// ---------------------------------------------------------------------------
// Generic validator
// ---------------------------------------------------------------------------

impl Schema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    /// Validate a candidate value against this schema.
    ///
    /// Succeeds only if the candidate is a JSON object and every declared
    /// field is present with the declared semantic type. Extra fields are
    /// ignored. On failure, every offending field is reported.
    pub fn validate(&self, candidate: &Value) -> Result<(), ValidationError> {
        let Some(object) = candidate.as_object() else {
            return Err(ValidationError {
                schema: self.name,
                issues: self
                    .fields
                    .iter()
                    .map(|spec| FieldIssue {
                        field: spec.name.to_string(),
                        expected: spec.ty,
                        problem: FieldProblem::Missing,
                    })
                    .collect(),
            });
        };

        let mut issues = Vec::new();
        for spec in self.fields {
            let problem = match object.get(spec.name) {
                None | Some(Value::Null) => Some(FieldProblem::Missing),
                Some(value) => check_type(spec.ty, value),
            };

            if let Some(problem) = problem {
                issues.push(FieldIssue {
                    field: spec.name.to_string(),
                    expected: spec.ty,
                    problem,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                schema: self.name,
                issues,
            })
        }
    }
}

/// Check a present value against its declared type.
fn check_type(ty: FieldType, value: &Value) -> Option<FieldProblem> {
    match ty {
        FieldType::Text => match value.as_str() {
            Some(s) if s.trim().is_empty() => Some(FieldProblem::Empty),
            Some(_) => None,
            None => Some(FieldProblem::WrongType),
        },
        FieldType::Number => {
            if value.is_number() {
                None
            } else {
                Some(FieldProblem::WrongType)
            }
        }
        FieldType::NumberMap => match value.as_object() {
            Some(map) if map.values().all(Value::is_number) => None,
            _ => Some(FieldProblem::WrongType),
        },
        FieldType::TextList => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => None,
            _ => Some(FieldProblem::WrongType),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Evaluation types.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// How an evaluation score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EvaluationMethod {
    /// Score supplied by the caller
    Provided,
    /// Score computed from the variant content
    Heuristic,
}

/// Caller-supplied evaluation input.
///
/// Every field is optional: the evaluated variant defaults to the run's selected
/// variant and a missing score is computed.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into, strip_option), default)]
pub struct EvaluationCriteria {
    /// Score in `[0, 100]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    /// Free-form reviewer notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    /// Variant under evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluated_variant_id: Option<String>,
}

impl EvaluationCriteria {
    /// Creates a new criteria builder.
    pub fn builder() -> EvaluationCriteriaBuilder {
        EvaluationCriteriaBuilder::default()
    }
}

/// A quality assessment attached to a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Score in `[0, 100]`
    score: f64,
    /// Reviewer notes
    notes: String,
    /// Variant the evaluation applies to
    evaluated_variant_id: String,
    /// Origin of the score
    method: EvaluationMethod,
    /// When the evaluation was produced
    evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Create a new evaluation stamped with the current time.
    pub fn new(
        score: f64,
        notes: impl Into<String>,
        evaluated_variant_id: impl Into<String>,
        method: EvaluationMethod,
    ) -> Self {
        Self {
            score,
            notes: notes.into(),
            evaluated_variant_id: evaluated_variant_id.into(),
            method,
            evaluated_at: Utc::now(),
        }
    }
}

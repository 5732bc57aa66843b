//! Generation run type and its lifecycle.

use crate::{Evaluation, ScriptVariant};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use scriptorium_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle state of a generation run.
///
/// `Pending → Generated → Selected ⇄ Evaluated`. Selection and evaluation may
/// repeat indefinitely; there is no terminal state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunState {
    /// Request accepted, variants not yet produced
    #[default]
    Pending,
    /// Variants produced and persisted with the default selection
    Generated,
    /// Selection explicitly updated
    Selected,
    /// Evaluation attached
    Evaluated,
}

impl RunState {
    /// Whether a run in this state may move to `next`.
    pub fn allows(self, next: RunState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Generated) => true,
            (Self::Pending, _) | (_, Self::Pending) | (_, Self::Generated) => false,
            (_, Self::Selected) | (_, Self::Evaluated) => true,
        }
    }
}

/// Identifies the builder that produced a run's variants.
///
/// Stub output is always labelled so it cannot be mistaken for a real result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct GeneratorInfo {
    /// Builder name (e.g. "template", "backend:gpt-4o-mini")
    name: String,
    /// True when content came from deterministic templating rather than a backend
    stub: bool,
}

impl GeneratorInfo {
    /// Create generator info.
    pub fn new(name: impl Into<String>, stub: bool) -> Self {
        Self {
            name: name.into(),
            stub,
        }
    }
}

/// One invocation of the pipeline: its variants plus selection and evaluation state.
///
/// The selected variant id always references one of `variants`. Deserialized runs
/// are checked against the same rules as [`GenerationRun::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase", try_from = "StoredRun")]
pub struct GenerationRun {
    /// Unique run identifier
    #[serde(rename = "runId")]
    id: String,
    /// External project reference
    project_id: String,
    /// Variants in generation order
    variants: Vec<ScriptVariant>,
    /// Currently selected variant
    selected_variant_id: String,
    /// Attached evaluation, if any
    evaluation: Option<Evaluation>,
    /// Lifecycle state
    state: RunState,
    /// Builder that produced the variants
    generator: GeneratorInfo,
    /// Creation time
    created_at: DateTime<Utc>,
    /// Last mutation time
    updated_at: DateTime<Utc>,
}

impl GenerationRun {
    /// Create a run selecting its first variant.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when `variants` is empty, contains duplicate ids or
    /// titles, or contains a variant with empty content.
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> Result<Self, PipelineError> {
        let first = variants
            .first()
            .ok_or_else(|| PipelineError::invalid_request("a run needs at least one variant"))?;
        let selected_variant_id = first.id().clone();

        check_variants(&variants)?;

        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            project_id: project_id.into(),
            variants,
            selected_variant_id,
            evaluation: None,
            state: RunState::Generated,
            generator,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `variant_id` belongs to this run.
    pub fn contains_variant(&self, variant_id: &str) -> bool {
        self.variants.iter().any(|v| v.id() == variant_id)
    }

    /// Look up a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&ScriptVariant> {
        self.variants.iter().find(|v| v.id() == variant_id)
    }

    /// The currently selected variant.
    pub fn selected_variant(&self) -> Option<&ScriptVariant> {
        self.variant(&self.selected_variant_id)
    }

    /// Select a variant.
    ///
    /// Repeating a selection that is already in effect leaves the run unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if `variant_id` is not part of this run; the run is
    /// left untouched.
    pub fn select(&mut self, variant_id: &str) -> Result<(), PipelineError> {
        if !self.contains_variant(variant_id) {
            return Err(PipelineError::new(PipelineErrorKind::InvalidSelection {
                run_id: self.id.clone(),
                variant_id: variant_id.to_string(),
            }));
        }
        if self.state == RunState::Selected && self.selected_variant_id == variant_id {
            return Ok(());
        }
        self.transition(RunState::Selected);
        self.selected_variant_id = variant_id.to_string();
        Ok(())
    }

    /// Replace the run's evaluation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the evaluation references a variant outside this run.
    pub fn attach_evaluation(&mut self, evaluation: Evaluation) -> Result<(), PipelineError> {
        if !self.contains_variant(evaluation.evaluated_variant_id()) {
            return Err(PipelineError::invalid_request(format!(
                "evaluation references variant '{}' which is not part of run '{}'",
                evaluation.evaluated_variant_id(),
                self.id
            )));
        }
        self.transition(RunState::Evaluated);
        self.evaluation = Some(evaluation);
        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        if !self.state.allows(next) {
            tracing::warn!(
                run_id = %self.id,
                from = %self.state,
                to = %next,
                "Unexpected run state transition"
            );
        }
        self.state = next;
        self.updated_at = Utc::now();
    }
}

/// Variant ids and titles are unique and every variant has content.
fn check_variants(variants: &[ScriptVariant]) -> Result<(), PipelineError> {
    let mut ids = HashSet::new();
    let mut titles = HashSet::new();
    for variant in variants {
        if !ids.insert(variant.id().as_str()) {
            return Err(PipelineError::invalid_request(format!(
                "duplicate variant id '{}'",
                variant.id()
            )));
        }
        if !titles.insert(variant.title().as_str()) {
            return Err(PipelineError::invalid_request(format!(
                "duplicate variant title '{}'",
                variant.title()
            )));
        }
        if variant.content().trim().is_empty() {
            return Err(PipelineError::invalid_request(format!(
                "variant '{}' has empty content",
                variant.id()
            )));
        }
    }
    Ok(())
}

/// Serialized form of a [`GenerationRun`], validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRun {
    #[serde(rename = "runId")]
    id: String,
    project_id: String,
    variants: Vec<ScriptVariant>,
    selected_variant_id: String,
    evaluation: Option<Evaluation>,
    state: RunState,
    generator: GeneratorInfo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoredRun> for GenerationRun {
    type Error = PipelineError;

    fn try_from(stored: StoredRun) -> Result<Self, Self::Error> {
        if stored.variants.is_empty() {
            return Err(PipelineError::invalid_request("a run needs at least one variant"));
        }
        check_variants(&stored.variants)?;
        let contains = |id: &str| stored.variants.iter().any(|v| v.id() == id);
        if !contains(&stored.selected_variant_id) {
            return Err(PipelineError::invalid_request(format!(
                "selectedVariantId '{}' is not part of run '{}'",
                stored.selected_variant_id, stored.id
            )));
        }
        if let Some(evaluation) = stored
            .evaluation
            .as_ref()
            .filter(|e| !contains(e.evaluated_variant_id()))
        {
            return Err(PipelineError::invalid_request(format!(
                "evaluation references variant '{}' which is not part of run '{}'",
                evaluation.evaluated_variant_id(),
                stored.id
            )));
        }
        if stored.state == RunState::Pending {
            return Err(PipelineError::invalid_request(format!(
                "run '{}' cannot be stored as pending",
                stored.id
            )));
        }

        Ok(Self {
            id: stored.id,
            project_id: stored.project_id,
            variants: stored.variants,
            selected_variant_id: stored.selected_variant_id,
            evaluation: stored.evaluation,
            state: stored.state,
            generator: stored.generator,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

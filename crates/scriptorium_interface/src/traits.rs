//! Trait definitions for pipeline collaborators.

use crate::OperationRecord;
use async_trait::async_trait;
use scriptorium_core::{Evaluation, GenerationRequest, GenerationRun, GeneratorInfo, ScriptVariant};
use scriptorium_error::{PipelineError, ScriptoriumResult};
use std::fmt;

/// Synthesizes script variants for a generation request.
///
/// Implementations must produce exactly `variant_count` variants with distinct ids,
/// titles unique within the batch and non-empty content. They hold no mutable state
/// shared between calls, so concurrent builds for different requests are safe.
#[async_trait]
pub trait ScriptBuilder: Send + Sync {
    /// Build the variants for `request`.
    async fn build(&self, request: &GenerationRequest) -> ScriptoriumResult<Vec<ScriptVariant>>;

    /// Label recorded on every run this builder produces.
    fn generator(&self) -> GeneratorInfo;
}

/// A change applied to one run while the store holds that run exclusively.
///
/// Stores apply the change to a copy and keep it only if the closure succeeds,
/// so a failed update leaves the stored run untouched.
pub struct RunUpdate(Box<dyn FnOnce(&mut GenerationRun) -> Result<(), PipelineError> + Send>);

impl RunUpdate {
    /// Wrap a closure.
    pub fn new(
        update: impl FnOnce(&mut GenerationRun) -> Result<(), PipelineError> + Send + 'static,
    ) -> Self {
        Self(Box::new(update))
    }

    /// Apply the change to `run`.
    pub fn apply(self, run: &mut GenerationRun) -> Result<(), PipelineError> {
        (self.0)(run)
    }
}

impl fmt::Debug for RunUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunUpdate")
    }
}

/// Storage for generation runs, keyed by run id.
///
/// Mutations on the same run are serialized; operations on different runs are
/// independent.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist a new run selecting its first variant.
    ///
    /// Fails with `InvalidRequest` if `variants` is empty.
    async fn create(
        &self,
        project_id: &str,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> ScriptoriumResult<GenerationRun>;

    /// Fetch a run. Fails with `NotFound` if absent.
    async fn get(&self, run_id: &str) -> ScriptoriumResult<GenerationRun>;

    /// Update the selected variant.
    ///
    /// Fails with `NotFound` if the run is missing and `InvalidSelection` if the
    /// variant is not part of it.
    async fn select_variant(&self, run_id: &str, variant_id: &str)
    -> ScriptoriumResult<GenerationRun>;

    /// Overwrite the run's evaluation. Fails with `NotFound` if the run is missing.
    async fn attach_evaluation(
        &self,
        run_id: &str,
        evaluation: Evaluation,
    ) -> ScriptoriumResult<GenerationRun>;

    /// Read and modify a run in one step, with no other mutation of that run in
    /// between.
    ///
    /// Fails with `NotFound` if the run is missing, or with the update's own error.
    async fn update(&self, run_id: &str, update: RunUpdate) -> ScriptoriumResult<GenerationRun>;

    /// All runs for a project in creation order.
    async fn list_for_project(&self, project_id: &str) -> ScriptoriumResult<Vec<GenerationRun>>;
}

/// Lookup of externally managed projects.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Fails with `NotFound` if the project does not exist.
    async fn ensure_exists(&self, project_id: &str) -> ScriptoriumResult<()>;
}

/// Injectable sink for per-operation observability records.
pub trait PipelineObserver: Send + Sync {
    /// Called once after every pipeline operation, successful or not.
    fn record(&self, record: &OperationRecord);
}

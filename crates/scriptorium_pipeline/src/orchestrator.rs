//! Pipeline orchestrator.

use crate::config::saturating_millis;
use crate::{EvaluationAttacher, OpenProjectDirectory, PipelineConfig, TracingObserver};
use scriptorium_core::{EvaluationCriteria, GenerationRequest, GenerationRun, GeneratorInfo};
use scriptorium_error::{BackendError, PipelineError, PipelineErrorKind, ScriptoriumResult};
use scriptorium_interface::{
    Operation, OperationOutcome, OperationRecord, PipelineObserver, ProjectDirectory, RunStore,
    RunUpdate, ScriptBuilder,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Entry point for generation, selection and evaluation.
///
/// Failures from the builder, store and project directory propagate unchanged.
/// Every operation reports one [`OperationRecord`] to the observer, whether it
/// succeeded or not.
///
/// # Examples
///
/// ```
/// use scriptorium_core::GenerationRequest;
/// use scriptorium_generation::TemplateScriptBuilder;
/// use scriptorium_pipeline::Pipeline;
/// use scriptorium_storage::InMemoryRunStore;
/// use std::sync::Arc;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let pipeline = Pipeline::new(
///     Arc::new(TemplateScriptBuilder::new()),
///     Arc::new(InMemoryRunStore::new()),
/// );
///
/// let run = pipeline
///     .generate("req-1", GenerationRequest::new("p1", 3))
///     .await
///     .unwrap();
/// assert_eq!(run.variants().len(), 3);
/// assert_eq!(run.selected_variant_id(), run.variants()[0].id());
/// # });
/// ```
#[derive(Clone)]
pub struct Pipeline {
    builder: Arc<dyn ScriptBuilder>,
    store: Arc<dyn RunStore>,
    projects: Arc<dyn ProjectDirectory>,
    observer: Arc<dyn PipelineObserver>,
    attacher: EvaluationAttacher,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("generator", &self.generator())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline accepting every project, logging through `tracing`, with default limits.
    pub fn new(builder: Arc<dyn ScriptBuilder>, store: Arc<dyn RunStore>) -> Self {
        Self {
            builder,
            store,
            projects: Arc::new(OpenProjectDirectory),
            observer: Arc::new(TracingObserver),
            attacher: EvaluationAttacher::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Replace the project directory.
    pub fn with_projects(mut self, projects: Arc<dyn ProjectDirectory>) -> Self {
        self.projects = projects;
        self
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the limits.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active limits.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Label of the builder producing this pipeline's runs.
    pub fn generator(&self) -> GeneratorInfo {
        self.builder.generator()
    }

    /// Generate variants for `request` and persist them as a new run.
    ///
    /// The run selects its first variant and carries the builder's generator label.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a blank project id or a variant count outside
    ///   `1..=max_variant_count`
    /// - `NotFound` if the project directory does not know the project
    /// - `GenerationTimeout` if the builder exceeds the configured timeout; nothing
    ///   is persisted in that case
    /// - any builder or store failure, unchanged
    #[instrument(
        skip(self, request),
        fields(project_id = %request.project_id(), count = request.variant_count())
    )]
    pub async fn generate(
        &self,
        request_id: &str,
        request: GenerationRequest,
    ) -> ScriptoriumResult<GenerationRun> {
        let started = Instant::now();
        let result = self.generate_inner(&request).await;
        let run_id = result.as_ref().ok().map(|run| run.id().clone());
        self.observe(request_id, Operation::Generate, run_id, started, &result);
        result
    }

    async fn generate_inner(
        &self,
        request: &GenerationRequest,
    ) -> ScriptoriumResult<GenerationRun> {
        request.validate(*self.config.max_variant_count())?;
        self.projects.ensure_exists(request.project_id()).await?;

        let timeout = self.config.generation_timeout();
        let variants = match tokio::time::timeout(timeout, self.builder.build(request)).await {
            Ok(built) => built?,
            Err(_) => {
                warn!(timeout_ms = saturating_millis(timeout), "Generation timed out");
                return Err(
                    PipelineError::new(PipelineErrorKind::GenerationTimeout(timeout)).into(),
                );
            }
        };

        let expected = *request.variant_count() as usize;
        if variants.len() != expected {
            return Err(BackendError::new(format!(
                "Builder returned {} variants, expected {}",
                variants.len(),
                expected
            ))
            .into());
        }

        let run = self
            .store
            .create(request.project_id(), variants, self.builder.generator())
            .await?;
        debug!(run_id = %run.id(), "Generation run persisted");
        Ok(run)
    }

    /// Select a variant of an existing run.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown run, `InvalidSelection` for a variant outside it.
    #[instrument(skip(self))]
    pub async fn select(
        &self,
        request_id: &str,
        run_id: &str,
        variant_id: &str,
    ) -> ScriptoriumResult<GenerationRun> {
        let started = Instant::now();
        let result = self.store.select_variant(run_id, variant_id).await;
        self.observe(
            request_id,
            Operation::Select,
            Some(run_id.to_string()),
            started,
            &result,
        );
        result
    }

    /// Compute an evaluation from `criteria` and attach it to the run.
    ///
    /// The default variant is resolved and the evaluation attached in one store
    /// update, so it is always the selection in effect when the evaluation is stored.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown run; `InvalidRequest` for a foreign variant or an
    /// out-of-range score.
    #[instrument(skip(self, criteria))]
    pub async fn evaluate(
        &self,
        request_id: &str,
        run_id: &str,
        criteria: EvaluationCriteria,
    ) -> ScriptoriumResult<GenerationRun> {
        let started = Instant::now();
        let result = self.evaluate_inner(run_id, &criteria).await;
        self.observe(
            request_id,
            Operation::Evaluate,
            Some(run_id.to_string()),
            started,
            &result,
        );
        result
    }

    async fn evaluate_inner(
        &self,
        run_id: &str,
        criteria: &EvaluationCriteria,
    ) -> ScriptoriumResult<GenerationRun> {
        let attacher = self.attacher;
        let criteria = criteria.clone();
        let update = RunUpdate::new(move |run| {
            let evaluation = attacher.evaluate(run, &criteria)?;
            run.attach_evaluation(evaluation)
        });
        self.store.update(run_id, update).await
    }

    /// Fetch a run.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown run.
    pub async fn get(&self, request_id: &str, run_id: &str) -> ScriptoriumResult<GenerationRun> {
        let started = Instant::now();
        let result = self.store.get(run_id).await;
        self.observe(
            request_id,
            Operation::Get,
            Some(run_id.to_string()),
            started,
            &result,
        );
        result
    }

    /// All runs for a project, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if the project directory does not know the project.
    pub async fn list_runs(
        &self,
        request_id: &str,
        project_id: &str,
    ) -> ScriptoriumResult<Vec<GenerationRun>> {
        let started = Instant::now();
        let result = match self.projects.ensure_exists(project_id).await {
            Ok(()) => self.store.list_for_project(project_id).await,
            Err(e) => Err(e),
        };
        self.observe(request_id, Operation::List, None, started, &result);
        result
    }

    fn observe<T>(
        &self,
        request_id: &str,
        operation: Operation,
        run_id: Option<String>,
        started: Instant,
        result: &ScriptoriumResult<T>,
    ) {
        let outcome = match result {
            Ok(_) => OperationOutcome::Success,
            Err(e) => OperationOutcome::Failure {
                kind: e.kind_label().to_string(),
            },
        };
        self.observer.record(&OperationRecord::new(
            request_id,
            operation,
            run_id,
            started.elapsed(),
            outcome,
        ));
    }
}

//! In-memory run store with per-run locking.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use scriptorium_core::{
    Evaluation, GenerationRun, GeneratorInfo, RUN_PREFIX, ScriptVariant, new_id,
};
use scriptorium_error::{PipelineError, ScriptoriumResult};
use scriptorium_interface::{RunStore, RunUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

type RunSlot = Arc<Mutex<GenerationRun>>;

#[derive(Debug, Default)]
struct Index {
    runs: HashMap<String, RunSlot>,
    by_project: HashMap<String, Vec<String>>,
}

/// Process-local run store.
///
/// The index lock is only held long enough to find a run's slot; the mutation
/// itself happens under that run's own mutex.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    index: RwLock<Index>,
}

impl InMemoryRunStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        self.index.read().runs.len()
    }

    /// Whether the store holds no runs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, run_id: &str) -> Result<RunSlot, PipelineError> {
        self.index
            .read()
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| PipelineError::not_found(format!("run '{}'", run_id)))
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    #[instrument(skip(self, variants, generator), fields(count = variants.len()))]
    async fn create(
        &self,
        project_id: &str,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> ScriptoriumResult<GenerationRun> {
        let run = GenerationRun::new(new_id(RUN_PREFIX), project_id, variants, generator)?;

        let mut index = self.index.write();
        index
            .runs
            .insert(run.id().clone(), Arc::new(Mutex::new(run.clone())));
        index
            .by_project
            .entry(project_id.to_string())
            .or_default()
            .push(run.id().clone());

        debug!(run_id = %run.id(), "Stored run");
        Ok(run)
    }

    async fn get(&self, run_id: &str) -> ScriptoriumResult<GenerationRun> {
        let slot = self.slot(run_id)?;
        let run = slot.lock().clone();
        Ok(run)
    }

    #[instrument(skip(self))]
    async fn select_variant(
        &self,
        run_id: &str,
        variant_id: &str,
    ) -> ScriptoriumResult<GenerationRun> {
        let slot = self.slot(run_id)?;
        let mut run = slot.lock();
        run.select(variant_id)?;
        Ok(run.clone())
    }

    #[instrument(skip(self, evaluation), fields(variant_id = %evaluation.evaluated_variant_id()))]
    async fn attach_evaluation(
        &self,
        run_id: &str,
        evaluation: Evaluation,
    ) -> ScriptoriumResult<GenerationRun> {
        let slot = self.slot(run_id)?;
        let mut run = slot.lock();
        run.attach_evaluation(evaluation)?;
        Ok(run.clone())
    }

    #[instrument(skip(self, update))]
    async fn update(&self, run_id: &str, update: RunUpdate) -> ScriptoriumResult<GenerationRun> {
        let slot = self.slot(run_id)?;
        let mut run = slot.lock();
        let mut next = run.clone();
        update.apply(&mut next)?;
        *run = next;
        Ok(run.clone())
    }

    async fn list_for_project(&self, project_id: &str) -> ScriptoriumResult<Vec<GenerationRun>> {
        let slots: Vec<RunSlot> = {
            let index = self.index.read();
            index
                .by_project
                .get(project_id)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| index.runs.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(slots.iter().map(|slot| slot.lock().clone()).collect())
    }
}

//! Actor-backed run store using Ractor.
//!
//! A single [`RunStoreActor`] owns every run, so all mutations are applied one
//! message at a time. [`ActorRunStore`] adapts the actor's message interface to
//! the [`RunStore`] trait.

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, MessagingErr, RpcReplyPort, rpc::CallResult};
use scriptorium_core::{
    Evaluation, GenerationRun, GeneratorInfo, RUN_PREFIX, ScriptVariant, new_id,
};
use scriptorium_error::{BackendError, PipelineError, ScriptoriumResult};
use scriptorium_interface::{RunStore, RunUpdate};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Runs and their per-project creation order.
#[derive(Debug, Default)]
pub struct RunTable {
    runs: HashMap<String, GenerationRun>,
    by_project: HashMap<String, Vec<String>>,
}

impl RunTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new run selecting its first variant.
    pub fn create(
        &mut self,
        project_id: &str,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> Result<GenerationRun, PipelineError> {
        let run = GenerationRun::new(new_id(RUN_PREFIX), project_id, variants, generator)?;
        self.by_project
            .entry(project_id.to_string())
            .or_default()
            .push(run.id().clone());
        self.runs.insert(run.id().clone(), run.clone());
        Ok(run)
    }

    /// Fetch a run.
    pub fn get(&self, run_id: &str) -> Result<&GenerationRun, PipelineError> {
        self.runs
            .get(run_id)
            .ok_or_else(|| PipelineError::not_found(format!("run '{}'", run_id)))
    }

    fn get_mut(&mut self, run_id: &str) -> Result<&mut GenerationRun, PipelineError> {
        self.runs
            .get_mut(run_id)
            .ok_or_else(|| PipelineError::not_found(format!("run '{}'", run_id)))
    }

    /// Update a run's selection.
    pub fn select_variant(
        &mut self,
        run_id: &str,
        variant_id: &str,
    ) -> Result<GenerationRun, PipelineError> {
        let run = self.get_mut(run_id)?;
        run.select(variant_id)?;
        Ok(run.clone())
    }

    /// Replace a run's evaluation.
    pub fn attach_evaluation(
        &mut self,
        run_id: &str,
        evaluation: Evaluation,
    ) -> Result<GenerationRun, PipelineError> {
        let run = self.get_mut(run_id)?;
        run.attach_evaluation(evaluation)?;
        Ok(run.clone())
    }

    /// Apply `update` to a run, keeping the result only if it succeeds.
    pub fn update(
        &mut self,
        run_id: &str,
        update: RunUpdate,
    ) -> Result<GenerationRun, PipelineError> {
        let run = self.get_mut(run_id)?;
        let mut next = run.clone();
        update.apply(&mut next)?;
        *run = next;
        Ok(run.clone())
    }

    /// Runs for a project in creation order.
    pub fn list_for_project(&self, project_id: &str) -> Vec<GenerationRun> {
        self.by_project
            .get(project_id)
            .map(|ids| ids.iter().filter_map(|id| self.runs.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the table holds no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Messages that the [`RunStoreActor`] can handle.
#[derive(Debug)]
pub enum RunStoreMessage {
    /// Persist a new run.
    Create {
        /// Owning project
        project_id: String,
        /// Generated variants
        variants: Vec<ScriptVariant>,
        /// Builder label
        generator: GeneratorInfo,
        /// Reply port for RPC response
        reply: RpcReplyPort<Result<GenerationRun, PipelineError>>,
    },
    /// Fetch a run.
    Get {
        /// Run to fetch
        run_id: String,
        /// Reply port for RPC response
        reply: RpcReplyPort<Result<GenerationRun, PipelineError>>,
    },
    /// Update a run's selection.
    Select {
        /// Run to update
        run_id: String,
        /// Variant to select
        variant_id: String,
        /// Reply port for RPC response
        reply: RpcReplyPort<Result<GenerationRun, PipelineError>>,
    },
    /// Replace a run's evaluation.
    AttachEvaluation {
        /// Run to update
        run_id: String,
        /// Evaluation to store
        evaluation: Evaluation,
        /// Reply port for RPC response
        reply: RpcReplyPort<Result<GenerationRun, PipelineError>>,
    },
    /// Read-modify-write a run.
    Update {
        /// Run to update
        run_id: String,
        /// Change to apply
        update: RunUpdate,
        /// Reply port for RPC response
        reply: RpcReplyPort<Result<GenerationRun, PipelineError>>,
    },
    /// List a project's runs.
    ListForProject {
        /// Project to list
        project_id: String,
        /// Reply port for RPC response
        reply: RpcReplyPort<Vec<GenerationRun>>,
    },
}

/// Single-writer actor owning a [`RunTable`].
pub struct RunStoreActor;

#[async_trait]
impl Actor for RunStoreActor {
    type Msg = RunStoreMessage;
    type State = RunTable;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("RunStoreActor started");
        Ok(RunTable::new())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        info!(runs = state.len(), "RunStoreActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RunStoreMessage::Create {
                project_id,
                variants,
                generator,
                reply,
            } => {
                let _ = reply.send(state.create(&project_id, variants, generator));
            }
            RunStoreMessage::Get { run_id, reply } => {
                let _ = reply.send(state.get(&run_id).cloned());
            }
            RunStoreMessage::Select {
                run_id,
                variant_id,
                reply,
            } => {
                let _ = reply.send(state.select_variant(&run_id, &variant_id));
            }
            RunStoreMessage::AttachEvaluation {
                run_id,
                evaluation,
                reply,
            } => {
                let _ = reply.send(state.attach_evaluation(&run_id, evaluation));
            }
            RunStoreMessage::Update {
                run_id,
                update,
                reply,
            } => {
                let _ = reply.send(state.update(&run_id, update));
            }
            RunStoreMessage::ListForProject { project_id, reply } => {
                let _ = reply.send(state.list_for_project(&project_id));
            }
        }
        Ok(())
    }
}

/// Helper to unwrap Ractor's CallResult into a standard Result
fn unwrap_call_result<T>(
    result: Result<CallResult<T>, MessagingErr<RunStoreMessage>>,
) -> Result<T, BackendError> {
    match result {
        Ok(CallResult::Success(inner)) => Ok(inner),
        Ok(CallResult::Timeout) => Err(BackendError::new("Run store actor call timed out")),
        Ok(CallResult::SenderError) => Err(BackendError::new("Run store actor sender error")),
        Err(e) => Err(BackendError::new(format!(
            "Failed to send message to run store actor: {}",
            e
        ))),
    }
}

/// [`RunStore`] backed by a [`RunStoreActor`].
///
/// Each store spawns and owns its actor; the actor is stopped when the store is
/// dropped.
pub struct ActorRunStore {
    actor: ActorRef<RunStoreMessage>,
}

impl ActorRunStore {
    /// Spawn a fresh actor and wrap it.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the actor fails to start.
    pub async fn spawn() -> ScriptoriumResult<Self> {
        let (actor, _handle) = Actor::spawn(None, RunStoreActor, ())
            .await
            .map_err(|e| BackendError::new(format!("Failed to spawn run store actor: {}", e)))?;
        debug!("Spawned run store actor");
        Ok(Self { actor })
    }
}

impl Drop for ActorRunStore {
    fn drop(&mut self) {
        self.actor.stop(None);
    }
}

#[async_trait]
impl RunStore for ActorRunStore {
    #[instrument(skip(self, variants, generator), fields(count = variants.len()))]
    async fn create(
        &self,
        project_id: &str,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> ScriptoriumResult<GenerationRun> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::Create {
                    project_id: project_id.to_string(),
                    variants,
                    generator,
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)??)
    }

    async fn get(&self, run_id: &str) -> ScriptoriumResult<GenerationRun> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::Get {
                    run_id: run_id.to_string(),
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)??)
    }

    #[instrument(skip(self))]
    async fn select_variant(
        &self,
        run_id: &str,
        variant_id: &str,
    ) -> ScriptoriumResult<GenerationRun> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::Select {
                    run_id: run_id.to_string(),
                    variant_id: variant_id.to_string(),
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)??)
    }

    #[instrument(skip(self, evaluation), fields(variant_id = %evaluation.evaluated_variant_id()))]
    async fn attach_evaluation(
        &self,
        run_id: &str,
        evaluation: Evaluation,
    ) -> ScriptoriumResult<GenerationRun> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::AttachEvaluation {
                    run_id: run_id.to_string(),
                    evaluation,
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)??)
    }

    #[instrument(skip(self, update))]
    async fn update(&self, run_id: &str, update: RunUpdate) -> ScriptoriumResult<GenerationRun> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::Update {
                    run_id: run_id.to_string(),
                    update,
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)??)
    }

    async fn list_for_project(&self, project_id: &str) -> ScriptoriumResult<Vec<GenerationRun>> {
        let result = self
            .actor
            .call(
                |reply| RunStoreMessage::ListForProject {
                    project_id: project_id.to_string(),
                    reply,
                },
                None,
            )
            .await;
        Ok(unwrap_call_result(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::EvaluationMethod;

    fn variants() -> Vec<ScriptVariant> {
        vec![
            ScriptVariant::new("v1", "Variant A", "alpha"),
            ScriptVariant::new("v2", "Variant B", "beta"),
        ]
    }

    #[test]
    fn table_keeps_project_order() {
        let mut table = RunTable::new();
        let info = GeneratorInfo::new("template", true);
        let first = table.create("p1", variants(), info.clone()).expect("created");
        let _other = table.create("p2", variants(), info.clone()).expect("created");
        let second = table.create("p1", variants(), info).expect("created");

        let listed: Vec<String> = table
            .list_for_project("p1")
            .iter()
            .map(|run| run.id().clone())
            .collect();
        assert_eq!(listed, vec![first.id().clone(), second.id().clone()]);
        assert!(table.list_for_project("unknown").is_empty());
    }

    #[test]
    fn table_rejects_foreign_evaluation() {
        let mut table = RunTable::new();
        let run = table
            .create("p1", variants(), GeneratorInfo::new("template", true))
            .expect("created");

        let err = table
            .attach_evaluation(
                run.id(),
                Evaluation::new(10.0, "", "elsewhere", EvaluationMethod::Provided),
            )
            .expect_err("foreign variant");
        assert_eq!(err.kind.label(), "InvalidRequest");
        assert!(table.get(run.id()).expect("stored").evaluation().is_none());
    }

    #[tokio::test]
    async fn actor_store_round_trip() {
        let store = ActorRunStore::spawn().await.expect("actor spawned");
        let run = store
            .create("p1", variants(), GeneratorInfo::new("template", true))
            .await
            .expect("created");

        let selected = store.select_variant(run.id(), "v2").await.expect("selected");
        assert_eq!(selected.selected_variant_id(), "v2");
        assert_eq!(store.get(run.id()).await.expect("stored"), selected);

        let err = store.get("run_missing").await.expect_err("missing");
        assert_eq!(err.kind_label(), "NotFound");
    }

    #[tokio::test]
    async fn dropping_a_store_leaves_other_stores_running() {
        let kept = ActorRunStore::spawn().await.expect("actor spawned");
        let dropped = ActorRunStore::spawn().await.expect("actor spawned");
        let run = kept
            .create("p1", variants(), GeneratorInfo::new("template", true))
            .await
            .expect("created");

        drop(dropped);

        assert_eq!(kept.get(run.id()).await.expect("still served").id(), run.id());
    }
}

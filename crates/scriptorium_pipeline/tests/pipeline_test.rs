//! End-to-end tests for the pipeline orchestrator.

use async_trait::async_trait;
use futures::future::join_all;
use scriptorium_core::{
    Evaluation, EvaluationCriteria, EvaluationMethod, GenerationRequest, GenerationRun,
    GeneratorInfo, RunState, ScriptVariant,
};
use scriptorium_error::{PipelineErrorKind, ScriptoriumResult};
use scriptorium_generation::TemplateScriptBuilder;
use scriptorium_interface::{Operation, RunStore, RunUpdate, ScriptBuilder};
use scriptorium_pipeline::{Pipeline, PipelineConfig, RecordingObserver, StaticProjectDirectory};
use scriptorium_storage::InMemoryRunStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn pipeline() -> (Pipeline, Arc<InMemoryRunStore>, Arc<RecordingObserver>) {
    let store = Arc::new(InMemoryRunStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let pipeline = Pipeline::new(Arc::new(TemplateScriptBuilder::new()), store.clone())
        .with_observer(observer.clone());
    (pipeline, store, observer)
}

/// Builder that never finishes within the test timeout.
struct SlowBuilder;

#[async_trait]
impl ScriptBuilder for SlowBuilder {
    async fn build(&self, request: &GenerationRequest) -> ScriptoriumResult<Vec<ScriptVariant>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        TemplateScriptBuilder::new().build(request).await
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new("slow", false)
    }
}

/// Builder that ignores the requested count.
struct ShortBuilder;

#[async_trait]
impl ScriptBuilder for ShortBuilder {
    async fn build(&self, _request: &GenerationRequest) -> ScriptoriumResult<Vec<ScriptVariant>> {
        Ok(vec![ScriptVariant::new("v1", "Variant A", "only one")])
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new("short", false)
    }
}

/// Store that lets another caller select the last variant right before every update.
struct SelectBeforeUpdateStore {
    inner: InMemoryRunStore,
}

#[async_trait]
impl RunStore for SelectBeforeUpdateStore {
    async fn create(
        &self,
        project_id: &str,
        variants: Vec<ScriptVariant>,
        generator: GeneratorInfo,
    ) -> ScriptoriumResult<GenerationRun> {
        self.inner.create(project_id, variants, generator).await
    }

    async fn get(&self, run_id: &str) -> ScriptoriumResult<GenerationRun> {
        self.inner.get(run_id).await
    }

    async fn select_variant(
        &self,
        run_id: &str,
        variant_id: &str,
    ) -> ScriptoriumResult<GenerationRun> {
        self.inner.select_variant(run_id, variant_id).await
    }

    async fn attach_evaluation(
        &self,
        run_id: &str,
        evaluation: Evaluation,
    ) -> ScriptoriumResult<GenerationRun> {
        self.inner.attach_evaluation(run_id, evaluation).await
    }

    async fn update(&self, run_id: &str, update: RunUpdate) -> ScriptoriumResult<GenerationRun> {
        let run = self.inner.get(run_id).await?;
        if let Some(last) = run.variants().last() {
            self.inner.select_variant(run_id, last.id()).await?;
        }
        self.inner.update(run_id, update).await
    }

    async fn list_for_project(&self, project_id: &str) -> ScriptoriumResult<Vec<GenerationRun>> {
        self.inner.list_for_project(project_id).await
    }
}

#[tokio::test]
async fn generate_three_variants() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req-1", GenerationRequest::new("p1", 3))
        .await
        .expect("generated");

    let titles: Vec<&str> = run.variants().iter().map(|v| v.title().as_str()).collect();
    assert_eq!(titles, vec!["Variant A", "Variant B", "Variant C"]);
    assert_eq!(run.selected_variant_id(), run.variants()[0].id());
    assert!(run.evaluation().is_none());
    assert_eq!(*run.state(), RunState::Generated);
    assert!(*run.generator().stub());
}

#[tokio::test]
async fn generate_returns_requested_count_with_distinct_ids() {
    let (pipeline, _store, _observer) = pipeline();
    for count in [1u32, 2, 7, 26] {
        let run = pipeline
            .generate("req", GenerationRequest::new("p1", count))
            .await
            .expect("generated");
        let ids: HashSet<&str> = run.variants().iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids.len(), count as usize);
        assert_eq!(run.selected_variant_id(), run.variants()[0].id());
    }
}

#[tokio::test]
async fn empty_project_is_invalid_request() {
    let (pipeline, store, observer) = pipeline();
    let err = pipeline
        .generate("req-1", GenerationRequest::new("", 1))
        .await
        .expect_err("rejected");

    assert!(matches!(
        err.pipeline_kind(),
        Some(PipelineErrorKind::InvalidRequest(_))
    ));
    assert!(store.is_empty());

    let records = observer.records_for(Operation::Generate);
    assert_eq!(records.len(), 1);
    assert!(!records[0].outcome().is_success());
    assert!(records[0].run_id().is_none());
}

#[tokio::test]
async fn variant_count_above_maximum_is_rejected() {
    let (pipeline, _store, _observer) = pipeline();
    let pipeline = pipeline.with_config(PipelineConfig::default().with_max_variant_count(4));

    let err = pipeline
        .generate("req", GenerationRequest::new("p1", 5))
        .await
        .expect_err("too many");
    assert_eq!(err.kind_label(), "InvalidRequest");
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let (pipeline, store, _observer) = pipeline();
    let pipeline = pipeline.with_projects(Arc::new(StaticProjectDirectory::new(["p1"])));

    let err = pipeline
        .generate("req", GenerationRequest::new("p2", 1))
        .await
        .expect_err("unknown project");
    assert_eq!(err.kind_label(), "NotFound");
    assert!(store.is_empty());

    let runs = pipeline.list_runs("req", "p1").await.expect("listed");
    assert!(runs.is_empty());
}

#[tokio::test]
async fn slow_builder_times_out_without_persisting() {
    let store = Arc::new(InMemoryRunStore::new());
    let pipeline = Pipeline::new(Arc::new(SlowBuilder), store.clone()).with_config(
        PipelineConfig::default().with_generation_timeout(Duration::from_millis(50)),
    );

    let err = pipeline
        .generate("req", GenerationRequest::new("p1", 2))
        .await
        .expect_err("timed out");

    assert_eq!(err.kind_label(), "GenerationTimeout");
    assert!(err.is_retryable());
    assert!(store.is_empty());
    assert!(store.list_for_project("p1").await.expect("listed").is_empty());
}

#[tokio::test]
async fn builder_count_mismatch_is_a_backend_failure() {
    let store = Arc::new(InMemoryRunStore::new());
    let pipeline = Pipeline::new(Arc::new(ShortBuilder), store.clone());

    let err = pipeline
        .generate("req", GenerationRequest::new("p1", 3))
        .await
        .expect_err("mismatch");
    assert_eq!(err.kind_label(), "BackendFailure");
    assert!(store.is_empty());
}

#[tokio::test]
async fn select_nonexistent_variant_is_invalid_selection() {
    let (pipeline, _store, observer) = pipeline();
    let run = pipeline
        .generate("req-1", GenerationRequest::new("p1", 2))
        .await
        .expect("generated");

    let err = pipeline
        .select("req-2", run.id(), "nonexistent")
        .await
        .expect_err("invalid");
    assert_eq!(err.kind_label(), "InvalidSelection");

    let unchanged = pipeline.get("req-3", run.id()).await.expect("stored");
    assert_eq!(unchanged, run);

    let selects = observer.records_for(Operation::Select);
    assert_eq!(selects.len(), 1);
    assert_eq!(selects[0].run_id().as_deref(), Some(run.id().as_str()));
}

#[tokio::test]
async fn selection_is_idempotent() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 3))
        .await
        .expect("generated");
    let target = run.variants()[2].id().clone();

    let first = pipeline.select("req", run.id(), &target).await.expect("selected");
    let second = pipeline.select("req", run.id(), &target).await.expect("selected");

    assert_eq!(first, second);
    assert_eq!(first.selected_variant_id(), &target);
    assert_eq!(*first.state(), RunState::Selected);
}

#[tokio::test]
async fn evaluate_with_score() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 2))
        .await
        .expect("generated");

    let criteria = EvaluationCriteria::builder()
        .score(85.0)
        .notes("ok")
        .evaluated_variant_id(run.selected_variant_id().clone())
        .build()
        .expect("criteria");
    let evaluated = pipeline
        .evaluate("req", run.id(), criteria)
        .await
        .expect("evaluated");

    let evaluation = evaluated.evaluation().as_ref().expect("attached");
    assert_eq!(*evaluation.score(), 85.0);
    assert_eq!(evaluation.notes(), "ok");
    assert_eq!(*evaluation.method(), EvaluationMethod::Provided);
    assert_eq!(*evaluated.state(), RunState::Evaluated);

    let stored = pipeline.get("req", run.id()).await.expect("stored");
    assert_eq!(stored.evaluation(), evaluated.evaluation());
}

#[tokio::test]
async fn evaluate_without_score_uses_heuristic() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 1))
        .await
        .expect("generated");

    let evaluated = pipeline
        .evaluate("req", run.id(), EvaluationCriteria::default())
        .await
        .expect("evaluated");
    let evaluation = evaluated.evaluation().as_ref().expect("attached");
    assert_eq!(*evaluation.method(), EvaluationMethod::Heuristic);
    assert!((0.0..=100.0).contains(evaluation.score()));
    assert_eq!(evaluation.evaluated_variant_id(), run.selected_variant_id());
}

#[tokio::test]
async fn evaluate_rejects_foreign_variant_and_unknown_run() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 1))
        .await
        .expect("generated");

    let foreign = EvaluationCriteria::builder()
        .evaluated_variant_id("var_elsewhere")
        .build()
        .expect("criteria");
    let err = pipeline
        .evaluate("req", run.id(), foreign)
        .await
        .expect_err("foreign");
    assert_eq!(err.kind_label(), "InvalidRequest");

    let err = pipeline
        .evaluate("req", "run_missing", EvaluationCriteria::default())
        .await
        .expect_err("missing");
    assert_eq!(err.kind_label(), "NotFound");
}

#[tokio::test]
async fn evaluation_defaults_to_selection_in_effect_when_stored() {
    let store = Arc::new(SelectBeforeUpdateStore {
        inner: InMemoryRunStore::new(),
    });
    let pipeline = Pipeline::new(Arc::new(TemplateScriptBuilder::new()), store);
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 3))
        .await
        .expect("generated");
    let last = run.variants()[2].id().clone();

    let evaluated = pipeline
        .evaluate("req", run.id(), EvaluationCriteria::default())
        .await
        .expect("evaluated");

    assert_eq!(evaluated.selected_variant_id(), &last);
    let evaluation = evaluated.evaluation().as_ref().expect("attached");
    assert_eq!(evaluation.evaluated_variant_id(), &last);
    assert_eq!(*evaluated.state(), RunState::Evaluated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_select_and_evaluate_keep_run_consistent() {
    let (pipeline, _store, _observer) = pipeline();
    let run = pipeline
        .generate("req", GenerationRequest::new("p1", 5))
        .await
        .expect("generated");
    let variant_ids: Vec<String> = run.variants().iter().map(|v| v.id().clone()).collect();

    let tasks = (0..50usize).map(|i| {
        let pipeline = pipeline.clone();
        let run_id = run.id().clone();
        let variant_id = variant_ids[i % variant_ids.len()].clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                pipeline.select("req", &run_id, &variant_id).await.map(|_| ())
            } else {
                let criteria = EvaluationCriteria::builder()
                    .score((i % 101) as f64)
                    .build()
                    .expect("criteria");
                pipeline.evaluate("req", &run_id, criteria).await.map(|run| {
                    let evaluation = run.evaluation().as_ref().expect("attached");
                    assert_eq!(evaluation.evaluated_variant_id(), run.selected_variant_id());
                })
            }
        })
    });

    for joined in join_all(tasks).await {
        joined.expect("task").expect("operation succeeded");
    }

    let stored = pipeline.get("req", run.id()).await.expect("stored");
    assert!(stored.contains_variant(stored.selected_variant_id()));
    let evaluation = stored.evaluation().as_ref().expect("evaluated");
    assert!(stored.contains_variant(evaluation.evaluated_variant_id()));
}

#[tokio::test]
async fn every_operation_is_observed() {
    let (pipeline, _store, observer) = pipeline();
    let run = pipeline
        .generate("req-gen", GenerationRequest::new("p1", 2))
        .await
        .expect("generated");
    pipeline.select("req-sel", run.id(), run.variants()[1].id()).await.expect("selected");
    pipeline
        .evaluate("req-eval", run.id(), EvaluationCriteria::default())
        .await
        .expect("evaluated");
    pipeline.get("req-get", run.id()).await.expect("fetched");
    pipeline.list_runs("req-list", "p1").await.expect("listed");

    let records = observer.records();
    let operations: Vec<Operation> = records.iter().map(|r| *r.operation()).collect();
    assert_eq!(
        operations,
        vec![
            Operation::Generate,
            Operation::Select,
            Operation::Evaluate,
            Operation::Get,
            Operation::List
        ]
    );
    assert_eq!(records[0].request_id(), "req-gen");
    assert_eq!(records[0].run_id().as_deref(), Some(run.id().as_str()));
    assert!(records.iter().all(|r| r.outcome().is_success()));
}

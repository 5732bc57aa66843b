//! Orchestration for the Scriptorium script generation pipeline.
//!
//! [`Pipeline`] ties a [`ScriptBuilder`](scriptorium_interface::ScriptBuilder), a
//! [`RunStore`](scriptorium_interface::RunStore) and a
//! [`ProjectDirectory`](scriptorium_interface::ProjectDirectory) together:
//!
//! ```text
//! generate: validate → project lookup → build (with timeout) → store.create
//! select:   store.select_variant
//! evaluate: store.update(EvaluationAttacher + attach)
//! ```
//!
//! Every operation reports an [`OperationRecord`](scriptorium_interface::OperationRecord)
//! to the configured [`PipelineObserver`](scriptorium_interface::PipelineObserver).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod evaluation;
mod observer;
mod orchestrator;
mod projects;

pub use config::PipelineConfig;
pub use evaluation::{EvaluationAttacher, heuristic_score};
pub use observer::{NoopObserver, RecordingObserver, TracingObserver};
pub use orchestrator::Pipeline;
pub use projects::{OpenProjectDirectory, StaticProjectDirectory};

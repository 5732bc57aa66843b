//! Trait interfaces for the Scriptorium pipeline.
//!
//! The pipeline is assembled from capabilities rather than concrete types:
//!
//! - [`ScriptBuilder`] - synthesizes script variants for a request
//! - [`RunStore`] - persists generation runs and serializes mutations per run
//! - [`ProjectDirectory`] - confirms that a project exists
//! - [`PipelineObserver`] - receives one record per pipeline operation
//!
//! Implementations live in `scriptorium_generation`, `scriptorium_storage` and
//! `scriptorium_pipeline`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observer;
mod traits;

pub use observer::{Operation, OperationOutcome, OperationRecord};
pub use traits::{PipelineObserver, ProjectDirectory, RunStore, RunUpdate, ScriptBuilder};

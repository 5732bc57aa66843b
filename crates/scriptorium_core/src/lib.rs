//! Core data types for the Scriptorium script generation pipeline.
//!
//! This crate provides the foundation data types shared by every Scriptorium crate:
//! generation requests, script variants, generation runs with their selection and
//! evaluation state, and the process-wide identifier generator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod evaluation;
mod id;
mod request;
mod run;
mod variant;

pub use evaluation::{Evaluation, EvaluationCriteria, EvaluationCriteriaBuilder, EvaluationMethod};
pub use id::{IdGenerator, new_id, RUN_PREFIX, VARIANT_PREFIX};
pub use request::{
    DEFAULT_MAX_VARIANT_COUNT, DEFAULT_VARIANT_COUNT, GenerationRequest, GenerationRequestBuilder, ProductMetadata,
    StyleOptions, Tone,
};
pub use run::{GenerationRun, GeneratorInfo, RunState};
pub use variant::{ScriptVariant, variant_title};

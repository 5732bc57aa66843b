//! Error types for the Scriptorium pipeline.
//!
//! This crate provides the foundation error types used throughout the Scriptorium workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use scriptorium_error::{PipelineError, PipelineErrorKind, ScriptoriumResult};
//!
//! fn lookup_run(run_id: &str) -> ScriptoriumResult<String> {
//!     Err(PipelineError::new(PipelineErrorKind::NotFound(format!("run {}", run_id))))?
//! }
//!
//! let err = lookup_run("run_0001").unwrap_err();
//! assert_eq!(err.kind_label(), "NotFound");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod pipeline;

pub use backend::BackendError;
pub use config::ConfigError;
pub use error::{ScriptoriumError, ScriptoriumErrorKind, ScriptoriumResult};
pub use pipeline::{PipelineError, PipelineErrorKind};

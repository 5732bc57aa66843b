//! Pipeline error types.

use std::time::Duration;

/// Specific error conditions for generation, selection and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Malformed or missing request fields
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// Unknown run or project
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Variant id is not part of the run
    #[display("Variant '{}' is not part of run '{}'", variant_id, run_id)]
    InvalidSelection {
        /// Run that was addressed
        run_id: String,
        /// Variant id that was requested
        variant_id: String,
    },
    /// Generation backend exceeded its allotted time
    #[display("Generation timed out after {:?}", _0)]
    GenerationTimeout(Duration),
}

impl PipelineErrorKind {
    /// Stable label used in response envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::NotFound(_) => "NotFound",
            Self::InvalidSelection { .. } => "InvalidSelection",
            Self::GenerationTimeout(_) => "GenerationTimeout",
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationTimeout(_))
    }
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::InvalidRequest("projectId is required".into()));
/// assert!(format!("{}", err).contains("projectId"));
/// assert_eq!(err.kind.label(), "InvalidRequest");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an `InvalidRequest` error.
    #[track_caller]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PipelineErrorKind::InvalidRequest(message.into()))
    }

    /// Shorthand for a `NotFound` error.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(PipelineErrorKind::NotFound(message.into()))
    }
}

//! Top-level error wrapper types.

use crate::{BackendError, ConfigError, PipelineError, PipelineErrorKind};

/// All error sources in the Scriptorium workspace.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{BackendError, ScriptoriumError};
///
/// let err: ScriptoriumError = BackendError::new("Connection refused").into();
/// assert!(format!("{}", err).contains("Backend Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ScriptoriumErrorKind {
    /// Pipeline error (request validation, lookup, selection, timeout)
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Generation backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Scriptorium error with kind discrimination.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{ConfigError, ScriptoriumResult};
///
/// fn might_fail() -> ScriptoriumResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.kind_label(), "Configuration");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Scriptorium Error: {}", _0)]
pub struct ScriptoriumError(Box<ScriptoriumErrorKind>);

impl ScriptoriumError {
    /// Create a new error from a kind.
    pub fn new(kind: ScriptoriumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ScriptoriumErrorKind {
        &self.0
    }

    /// The pipeline error kind, if this is a pipeline error.
    pub fn pipeline_kind(&self) -> Option<&PipelineErrorKind> {
        match self.kind() {
            ScriptoriumErrorKind::Pipeline(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Stable label used in response envelopes.
    pub fn kind_label(&self) -> &'static str {
        match self.kind() {
            ScriptoriumErrorKind::Pipeline(e) => e.kind.label(),
            ScriptoriumErrorKind::Backend(_) => "BackendFailure",
            ScriptoriumErrorKind::Config(_) => "Configuration",
        }
    }

    /// Human-readable message without location details.
    pub fn message(&self) -> String {
        match self.kind() {
            ScriptoriumErrorKind::Pipeline(e) => e.kind.to_string(),
            ScriptoriumErrorKind::Backend(e) => e.message.clone(),
            ScriptoriumErrorKind::Config(e) => e.message.clone(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            ScriptoriumErrorKind::Pipeline(e) => e.kind.is_retryable(),
            ScriptoriumErrorKind::Backend(_) => true,
            ScriptoriumErrorKind::Config(_) => false,
        }
    }
}

// Generic From implementation for any type that converts to ScriptoriumErrorKind
impl<T> From<T> for ScriptoriumError
where
    T: Into<ScriptoriumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Scriptorium operations.
pub type ScriptoriumResult<T> = std::result::Result<T, ScriptoriumError>;

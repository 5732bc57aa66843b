//! Observability record types.

use derive_getters::Getters;
use serde::Serialize;
use std::time::Duration;

/// Pipeline operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// Variant generation
    Generate,
    /// Selection update
    Select,
    /// Evaluation attachment
    Evaluate,
    /// Run lookup
    Get,
    /// Project run listing
    List,
}

/// Outcome of a pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OperationOutcome {
    /// The operation succeeded
    Success,
    /// The operation failed with the given envelope kind
    Failure {
        /// Stable error label (e.g. "InvalidSelection")
        kind: String,
    },
}

impl OperationOutcome {
    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One observed pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Caller-supplied request id
    request_id: String,
    /// Operation kind
    operation: Operation,
    /// Run the operation addressed or produced, if known
    run_id: Option<String>,
    /// Wall-clock duration
    duration: Duration,
    /// Success or failure kind
    outcome: OperationOutcome,
}

impl OperationRecord {
    /// Create a record.
    pub fn new(
        request_id: impl Into<String>,
        operation: Operation,
        run_id: Option<String>,
        duration: Duration,
        outcome: OperationOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            operation,
            run_id,
            duration,
            outcome,
        }
    }
}

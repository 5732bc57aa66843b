//! [`PipelineObserver`] implementations.

use parking_lot::Mutex;
use scriptorium_interface::{Operation, OperationOutcome, OperationRecord, PipelineObserver};

/// Emits one structured `tracing` event per operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn record(&self, record: &OperationRecord) {
        let duration_ms = record.duration().as_secs_f64() * 1000.0;
        let run_id = record.run_id().as_deref().unwrap_or("-");
        match record.outcome() {
            OperationOutcome::Success => tracing::info!(
                request_id = %record.request_id(),
                operation = %record.operation(),
                run_id,
                duration_ms,
                "Pipeline operation succeeded"
            ),
            OperationOutcome::Failure { kind } => tracing::warn!(
                request_id = %record.request_id(),
                operation = %record.operation(),
                run_id,
                duration_ms,
                kind = %kind,
                "Pipeline operation failed"
            ),
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<OperationRecord>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records so far, in arrival order.
    pub fn records(&self) -> Vec<OperationRecord> {
        self.records.lock().clone()
    }

    /// Records for one operation kind.
    pub fn records_for(&self, operation: Operation) -> Vec<OperationRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| *r.operation() == operation)
            .cloned()
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn record(&self, record: &OperationRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn record(&self, _record: &OperationRecord) {}
}

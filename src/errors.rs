use thiserror::Error;

/// Per-record failure taxonomy for batch processing. These are aggregated
/// into the batch summary and never propagated past the batch boundary;
/// only store-wide unavailability surfaces as a top-level `anyhow::Error`.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Price lookup or single-row write failed; the record is skipped this
    /// cycle and retried on the next scheduled run.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Persisted data violates an upstream validation rule (zero entry
    /// price, unknown action). Skip and report, never crash the batch.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Derived state contradicts a lifecycle invariant (e.g. closed signal
    /// with no exit price). Hard error for this record only.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

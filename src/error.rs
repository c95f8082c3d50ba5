//! Error types for the pagebatch library.
//!
//! Only *fatal* conditions are modelled as errors. A batch that the engine
//! rejects or crashes on is not an error from the library's point of view:
//! it becomes a [`crate::ledger::BatchOutcome::FailedStatus`] or
//! [`crate::ledger::BatchOutcome::FailedError`] entry in the run's ledger,
//! and processing continues with the next batch.
//!
//! The split keeps the control flow honest: `Err(BatchError)` from
//! [`crate::process::BatchProcessor::run_to_file`] always means "the run did
//! not complete", while a completed run with failures is an `Ok(RunReport)`
//! whose statistics carry the failure counts.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pagebatch library.
///
/// Batch-level failures are stored in the ledger as
/// [`crate::ledger::BatchOutcome`] variants rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The host does not have enough memory to run the engine at all.
    ///
    /// Raised by the estimator before any partitioning or conversion begins.
    #[error(
        "Insufficient memory: {available_gb:.1} GB available, but {required_gb:.1} GB needed for engine overhead.\n\
         Free up memory or lower overhead_gb in the batching config."
    )]
    InsufficientMemory {
        available_gb: f64,
        required_gb: f64,
    },

    /// The document's page count could not be read.
    ///
    /// Nothing can be planned without it, so this aborts before any
    /// partitioning.
    #[error("Failed to read document metadata: {detail}")]
    MetadataUnavailable { detail: String },

    /// The conversion engine failed its once-per-run initialisation.
    ///
    /// Distinct from per-batch engine failures: nothing was converted yet,
    /// so there is no partial output to keep.
    #[error("Conversion engine failed to initialise: {detail}")]
    EngineInitFailed { detail: String },

    /// Could not create, write, or flush the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_memory_display_carries_both_amounts() {
        let e = BatchError::InsufficientMemory {
            available_gb: 0.4,
            required_gb: 0.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("0.4 GB available"), "got: {msg}");
        assert!(msg.contains("0.5 GB needed"), "got: {msg}");
    }

    #[test]
    fn output_write_failed_preserves_source() {
        use std::error::Error as _;

        let e = BatchError::OutputWriteFailed {
            path: PathBuf::from("/tmp/out.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/tmp/out.md"));
        assert!(e.source().is_some());
    }

    #[test]
    fn engine_init_display() {
        let e = BatchError::EngineInitFailed {
            detail: "model download failed".into(),
        };
        assert!(e.to_string().contains("model download failed"));
    }
}

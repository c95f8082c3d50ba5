//! The conversion-engine collaborator contract.
//!
//! The engine is the expensive part: layout analysis, OCR, table models.
//! None of that lives here. The library sees a narrow, page-range-in,
//! markdown-or-status-out surface, so the batch loop can drive any engine
//! (and tests can drive a scripted fake) through the same trait.
//!
//! An engine distinguishes two failure shapes, and the batch loop records
//! them differently:
//!
//! * the engine *ran* and reported a non-success [`EngineStatus`]: the
//!   output carries the status and the ledger stores it verbatim;
//! * the engine *broke* (panic-adjacent internal error, crashed
//!   subprocess): the call returns [`EngineError`] and the ledger stores
//!   the message.
//!
//! Neither aborts the run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Status the engine reports for a completed conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// All pages in the range converted.
    Success,
    /// The engine produced output but flagged degraded quality.
    PartialSuccess,
    /// The engine ran and could not convert the range.
    Failure,
}

impl EngineStatus {
    /// Whether the batch loop should treat the output as usable markdown.
    pub fn is_success(self) -> bool {
        matches!(self, EngineStatus::Success)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineStatus::Success => "SUCCESS",
            EngineStatus::PartialSuccess => "PARTIAL_SUCCESS",
            EngineStatus::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// What one engine call produces: a status and, on the success path, the
/// range's markdown.
///
/// This struct owns the batch's transient working set as far as the library
/// is concerned; the batch loop drops it before the next batch starts.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub status: EngineStatus,
    pub markdown: String,
}

/// Engine-internal error: the call did not complete.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// External conversion engine, consumed through a page-range contract.
///
/// One engine instance serves one document run: [`initialize`] is called
/// once, then [`convert`] once per batch, strictly in order. Calls may block
/// for minutes; the library imposes no deadline (wrap with
/// `tokio::time::timeout` if cancellation is needed).
///
/// [`initialize`]: ConversionEngine::initialize
/// [`convert`]: ConversionEngine::convert
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// One-time pipeline setup (model loading, subprocess spawn).
    ///
    /// Called once per document run, before the first batch. The default is
    /// a no-op for engines with nothing to warm up.
    async fn initialize(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Convert the inclusive, 1-indexed page range of `doc` to Markdown.
    async fn convert(
        &self,
        doc: &Path,
        start_page: u32,
        end_page: u32,
    ) -> Result<EngineOutput, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_marker_format() {
        assert_eq!(EngineStatus::Success.to_string(), "SUCCESS");
        assert_eq!(EngineStatus::PartialSuccess.to_string(), "PARTIAL_SUCCESS");
        assert_eq!(EngineStatus::Failure.to_string(), "FAILURE");
    }

    #[test]
    fn only_success_is_success() {
        assert!(EngineStatus::Success.is_success());
        assert!(!EngineStatus::PartialSuccess.is_success());
        assert!(!EngineStatus::Failure.is_success());
    }

    #[test]
    fn engine_error_display_is_transparent() {
        let e = EngineError::new("page decoder crashed");
        assert_eq!(e.to_string(), "page decoder crashed");
    }
}

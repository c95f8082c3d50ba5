//! Progress-callback trait for per-batch processing events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchingConfigBuilder::progress_callback`] to receive
//! events as the processor works through a run.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: hosts can
//! forward events to an RPC stream, a database record, or a terminal
//! display without the library knowing how they communicate. Within one run
//! events arrive strictly in order from the single processing loop, but the
//! trait is `Send + Sync` so one callback can serve several documents
//! processed in parallel.

use crate::partition::BatchRange;
use std::sync::Arc;

/// Called by the processor as it works through a run's batches.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after planning, before the first batch.
    ///
    /// # Arguments
    /// * `total_batches`: number of batches in the plan
    /// * `total_pages`: pages in the document
    fn on_run_start(&self, total_batches: usize, total_pages: u32) {
        let _ = (total_batches, total_pages);
    }

    /// Called just before a batch's engine call.
    ///
    /// # Arguments
    /// * `batch_number`: 1-indexed position in the run
    /// * `total_batches`: number of batches in the plan
    /// * `range`: the pages and label being converted
    fn on_batch_start(&self, batch_number: u32, total_batches: usize, range: &BatchRange) {
        let _ = (batch_number, total_batches, range);
    }

    /// Called when a batch converts successfully.
    ///
    /// # Arguments
    /// * `markdown_len`: byte length of the batch's Markdown
    fn on_batch_complete(&self, batch_number: u32, total_batches: usize, markdown_len: usize) {
        let _ = (batch_number, total_batches, markdown_len);
    }

    /// Called when a batch fails (non-success status or engine error).
    ///
    /// # Arguments
    /// * `detail`: the reported status or error message
    fn on_batch_failed(&self, batch_number: u32, total_batches: usize, detail: String) {
        let _ = (batch_number, total_batches, detail);
    }

    /// Called once after the last batch, before the report is returned.
    ///
    /// # Arguments
    /// * `success_count`: batches that converted without failure
    fn on_run_complete(&self, total_batches: usize, success_count: u32) {
        let _ = (total_batches, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchingConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

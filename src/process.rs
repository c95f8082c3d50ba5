//! The batch processor: drives one document's full conversion run.
//!
//! ## Run shape
//!
//! ```text
//! plan      size the batches (memory budget → partitioner)
//!  │
//! init      initialise the engine once, write the sink header
//!  │
//! process   for each range, in order:
//!  │          convert → ledger append → stats fold → sink write + flush
//!  │          release the batch's working set before the next one starts
//!  │
//! done      finalise stats, return ledger + stats as a RunReport
//! ```
//!
//! Per-batch failures never abort the run; they become ledger entries and
//! the loop moves on. Only estimator failures, unreadable metadata, engine
//! initialisation failure, and sink I/O errors are fatal.
//!
//! The processor is an explicit context object: it owns `Arc` handles to
//! its collaborators and a config, constructed once and passed around, with
//! no process-wide singletons. It is `Send + Sync`, so one instance can serve
//! several documents in parallel; *within* one run, processing is strictly
//! sequential because all batches share one engine instance and one sink
//! handle, and peak memory is bounded to a single batch's footprint.

use crate::config::BatchingConfig;
use crate::engine::{ConversionEngine, EngineOutput};
use crate::error::BatchError;
use crate::ledger::{BatchOutcome, BatchResult, BatchingStrategy, ProcessingStats, RunReport};
use crate::memory::{estimate_batch_size, MemoryBudget, MemoryProbe, SystemMemoryProbe};
use crate::outline::OutlineSource;
use crate::partition::{fixed_batches, outline_batches, BatchRange};
use crate::sink::{MarkdownSink, RunHeader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The immutable plan a run executes: computed once, then read-only.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub total_pages: u32,
    pub budget: MemoryBudget,
    pub strategy: BatchingStrategy,
    /// Ordered ranges tiling `[1, total_pages]`.
    pub batches: Vec<BatchRange>,
}

/// Orchestrator for batched document conversion.
///
/// Construct once with the collaborators and reuse across documents.
pub struct BatchProcessor {
    engine: Arc<dyn ConversionEngine>,
    outline: Arc<dyn OutlineSource>,
    probe: Arc<dyn MemoryProbe>,
    config: BatchingConfig,
}

impl BatchProcessor {
    /// Create a processor with the default host memory probe.
    pub fn new(
        engine: Arc<dyn ConversionEngine>,
        outline: Arc<dyn OutlineSource>,
        config: BatchingConfig,
    ) -> Self {
        Self {
            engine,
            outline,
            probe: Arc::new(SystemMemoryProbe),
            config,
        }
    }

    /// Replace the host memory probe (tests, cgroup-aware hosts).
    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &BatchingConfig {
        &self.config
    }

    /// Compute the run plan for a document: page count, memory budget, and
    /// the batch ranges.
    ///
    /// Strategy selection: smart batching is used when it is enabled, the
    /// outline collaborator returns entries, and the partitioner derives at
    /// least one chapter batch from them. Outline failures are caught here
    /// and only ever force the fixed path; they never propagate.
    pub async fn plan(&self, doc: &Path) -> Result<RunPlan, BatchError> {
        info!("reading document metadata from {}", doc.display());
        let total_pages = self.outline.page_count(doc).await.map_err(|e| {
            BatchError::MetadataUnavailable {
                detail: e.to_string(),
            }
        })?;
        info!("document has {total_pages} pages");

        let budget = estimate_batch_size(&self.config, self.probe.as_ref())?;
        let max_batch_size = budget.recommended_batch_size;
        info!(
            "memory budget: {} pages per batch, ~{:.2} GB peak",
            max_batch_size, budget.peak_memory_gb
        );

        let mut strategy = BatchingStrategy::Fixed;
        let mut batches = Vec::new();

        if self.config.use_smart_batching && total_pages >= 1 {
            info!("attempting smart batching based on document outline");
            match self.outline.outline(doc).await {
                Ok(entries) if entries.is_empty() => {
                    info!("document has no outline/bookmarks");
                }
                Ok(entries) => {
                    batches = outline_batches(&entries, total_pages, max_batch_size);
                    if batches.is_empty() {
                        warn!("could not derive chapter batches from outline");
                    } else {
                        strategy = BatchingStrategy::Smart;
                        let (min, max) = batches
                            .iter()
                            .fold((u32::MAX, 0), |(lo, hi), b| {
                                (lo.min(b.num_pages()), hi.max(b.num_pages()))
                            });
                        info!(
                            "smart batching enabled: {} chapter-based batches ({min}-{max} pages)",
                            batches.len()
                        );
                    }
                }
                Err(e) => {
                    warn!("smart batching failed: {e}");
                }
            }
        }

        if batches.is_empty() && total_pages >= 1 {
            info!("using fixed-size batching: {max_batch_size} pages per batch");
            batches = fixed_batches(total_pages, max_batch_size);
        }

        Ok(RunPlan {
            total_pages,
            budget,
            strategy,
            batches,
        })
    }

    /// Run a full conversion, writing incremental output to `output_path`.
    ///
    /// The file is created up front and flushed after every batch, so a
    /// crash mid-run leaves all completed batches durable on disk.
    ///
    /// # Errors
    /// Fatal conditions only; a completed run with failed batches is
    /// `Ok`. Inspect `report.stats.failed_batches`.
    pub async fn run_to_file(
        &self,
        doc: &Path,
        output_path: &Path,
    ) -> Result<RunReport, BatchError> {
        // parent() is Some("") for bare file names; nothing to create then.
        let parent = output_path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BatchError::OutputWriteFailed {
                    path: output_path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        let file = File::create(output_path).map_err(|e| BatchError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;
        let mut sink = MarkdownSink::new(BufWriter::new(file), output_path);
        self.run_with_sink(doc, &mut sink).await
    }

    /// Run a full conversion against an already-open sink.
    pub async fn run_with_sink<W: Write + Send>(
        &self,
        doc: &Path,
        sink: &mut MarkdownSink<W>,
    ) -> Result<RunReport, BatchError> {
        let run_start = Instant::now();
        let plan = self.plan(doc).await?;
        let total_batches = plan.batches.len();
        info!("will process in {total_batches} batches");

        // One engine instance serves the whole run.
        let init_start = Instant::now();
        self.engine
            .initialize()
            .await
            .map_err(|e| BatchError::EngineInitFailed {
                detail: e.to_string(),
            })?;
        info!(
            "engine initialised in {:.2}s",
            init_start.elapsed().as_secs_f64()
        );

        sink.write_run_header(&RunHeader {
            document_name: document_name(doc),
            total_pages: plan.total_pages,
            max_batch_size: plan.budget.recommended_batch_size,
            smart_batching: self.config.use_smart_batching,
        })?;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_start(total_batches, plan.total_pages);
        }

        let mut ledger: Vec<BatchResult> = Vec::with_capacity(total_batches);
        let mut stats = ProcessingStats::new(plan.total_pages);

        for (i, range) in plan.batches.iter().enumerate() {
            let batch_number = (i + 1) as u32;
            info!(
                "BATCH {batch_number}/{total_batches}: Pages {}-{} ({} pages)",
                range.start_page,
                range.end_page,
                range.num_pages()
            );
            info!("  content: {}", range.description);

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_batch_start(batch_number, total_batches, range);
            }

            let batch_start = Instant::now();
            let outcome = self.process_batch(doc, batch_number, range, sink).await?;
            let duration_ms = batch_start.elapsed().as_millis() as u64;

            if let Some(ref cb) = self.config.progress_callback {
                match &outcome {
                    BatchOutcome::Success { markdown } => {
                        cb.on_batch_complete(batch_number, total_batches, markdown.len());
                    }
                    BatchOutcome::FailedStatus { status } => {
                        cb.on_batch_failed(batch_number, total_batches, status.clone());
                    }
                    BatchOutcome::FailedError { message } => {
                        cb.on_batch_failed(batch_number, total_batches, message.clone());
                    }
                }
            }

            let result = BatchResult::new(batch_number, range, outcome);
            stats.record(&result, duration_ms);
            ledger.push(result);

            info!(
                "batch {batch_number} done in {:.2}s, progress: {}/{} pages",
                duration_ms as f64 / 1000.0,
                stats.processed_pages,
                plan.total_pages
            );
            // Nothing from this batch except its ledger entry is live past
            // this line; the next batch starts from a clean working set.
        }

        stats.total_duration_ms = run_start.elapsed().as_millis() as u64;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(total_batches, stats.successful_batches);
        }

        info!(
            "run complete: {}/{} batches succeeded, {}/{} pages, {:.2}s",
            stats.successful_batches,
            total_batches,
            stats.processed_pages,
            plan.total_pages,
            stats.total_duration_ms as f64 / 1000.0
        );

        Ok(RunReport {
            strategy: plan.strategy,
            budget: plan.budget,
            total_pages: plan.total_pages,
            batches: ledger,
            stats,
        })
    }

    /// Convert one range and write its outcome to the sink.
    ///
    /// The three-way outcome (success / reported failure / engine error) is
    /// returned as data; only sink I/O failures propagate as `Err`. The
    /// engine's output is fully consumed here: on the success path its
    /// markdown moves into the returned outcome, everything else is dropped
    /// before the function returns.
    async fn process_batch<W: Write + Send>(
        &self,
        doc: &Path,
        batch_number: u32,
        range: &BatchRange,
        sink: &mut MarkdownSink<W>,
    ) -> Result<BatchOutcome, BatchError> {
        match self
            .engine
            .convert(doc, range.start_page, range.end_page)
            .await
        {
            Ok(EngineOutput { status, markdown }) if status.is_success() => {
                sink.write_batch(batch_number, range, &markdown)?;
                Ok(BatchOutcome::Success { markdown })
            }
            Ok(EngineOutput { status, markdown }) => {
                warn!("batch {batch_number} conversion status: {status}");
                // Partial output from a non-success call is not kept.
                drop(markdown);
                sink.write_failed_status(batch_number, &status.to_string())?;
                Ok(BatchOutcome::FailedStatus {
                    status: status.to_string(),
                })
            }
            Err(e) => {
                error!("batch {batch_number} failed with error: {e}");
                sink.write_failed_error(batch_number, &e.to_string())?;
                Ok(BatchOutcome::FailedError {
                    message: e.to_string(),
                })
            }
        }
    }
}

fn document_name(doc: &Path) -> String {
    doc.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| doc.display().to_string())
}

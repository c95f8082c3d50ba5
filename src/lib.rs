//! # pagebatch
//!
//! Convert large multi-page documents to Markdown in memory-bounded,
//! chapter-aware batches.
//!
//! ## Why this crate?
//!
//! Heavyweight conversion engines (layout analysis, OCR, table models) hold
//! an entire document's working set in memory. Feed one a 600-page rulebook
//! and it takes the host down with it. This crate bounds peak memory by
//! processing a document as a sequence of page-range batches sized to the
//! host's available RAM and, when the document carries an outline, aligned
//! to its chapter boundaries so each engine call sees coherent content.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Budget     estimate pages per batch from available memory
//!  ├─ 2. Partition  chapter-aligned ranges (outline) or fixed-size fallback
//!  ├─ 3. Process    one engine call per range, strictly sequential
//!  ├─ 4. Ledger     append-only BatchResult per range; failures don't abort
//!  └─ 5. Output     incremental Markdown file, flushed after every batch
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagebatch::{BatchProcessor, BatchingConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     engine: Arc<dyn pagebatch::ConversionEngine>,
//! #     outline: Arc<dyn pagebatch::OutlineSource>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchingConfig::builder()
//!     .memory_per_page_mb(67.8)
//!     .build()?;
//!
//! let processor = BatchProcessor::new(engine, outline, config);
//! let report = processor
//!     .run_to_file(Path::new("rulebook.pdf"), Path::new("rulebook.md"))
//!     .await?;
//!
//! println!(
//!     "{}/{} batches succeeded, {} pages converted",
//!     report.stats.successful_batches,
//!     report.batches.len(),
//!     report.stats.processed_pages,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! The conversion engine and the outline reader are collaborators injected
//! through the [`ConversionEngine`] and [`OutlineSource`] traits; this crate
//! contains no document parsing of its own.
//!
//! ## Failure model
//!
//! A batch the engine rejects or crashes on becomes a ledger entry, not an
//! error: the run continues, the output file gets a failure marker, and the
//! final [`RunReport`] carries the counts. `Err` from the run entry points
//! always means the run itself could not complete (insufficient memory,
//! unreadable metadata, engine initialisation failure, output I/O).
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagebatch` planning binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pagebatch = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod outline;
pub mod partition;
pub mod process;
pub mod progress;
pub mod record;
pub mod sink;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchingConfig, BatchingConfigBuilder};
pub use engine::{ConversionEngine, EngineError, EngineOutput, EngineStatus};
pub use error::BatchError;
pub use ledger::{BatchOutcome, BatchResult, BatchingStrategy, ProcessingStats, RunReport};
pub use memory::{estimate_batch_size, FixedMemoryProbe, MemoryBudget, MemoryProbe, SystemMemoryProbe};
pub use outline::{chapters, Chapter, OutlineEntry, OutlineError, OutlineSource};
pub use partition::{fixed_batches, outline_batches, BatchRange};
pub use process::{BatchProcessor, RunPlan};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::DocumentRecord;
pub use sink::{MarkdownSink, RunHeader};

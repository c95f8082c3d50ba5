//! The serialisable record a storage collaborator persists after a run.
//!
//! The core does not talk to a database; it hands this struct to whatever
//! service layer owns persistence. Everything in it is derived from the
//! [`crate::ledger::RunReport`] plus caller-supplied document metadata.

use crate::ledger::{BatchResult, BatchingStrategy, RunReport};
use crate::memory::MemoryBudget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One converted document, as the storage layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    /// Display name, usually the source file name.
    pub name: String,
    pub page_count: u32,
    /// Source document size in bytes.
    pub file_size: u64,
    pub batch_count: u32,
    pub successful_batches: u32,
    pub failed_batches: u32,
    /// The run's full ledger, markdown included.
    pub batches: Vec<BatchResult>,
    /// The memory plan the run was sized with.
    pub batch_config: MemoryBudget,
    pub use_smart_batching: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl DocumentRecord {
    /// Build a record from a completed run.
    ///
    /// Generates a fresh v4 id and stamps both timestamps with the same
    /// instant; the storage layer bumps `updated_at` on later writes.
    pub fn from_report(
        name: impl Into<String>,
        file_size: u64,
        tags: Vec<String>,
        report: &RunReport,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            page_count: report.total_pages,
            batch_count: report.batches.len() as u32,
            successful_batches: report.stats.successful_batches,
            failed_batches: report.stats.failed_batches,
            batches: report.batches.clone(),
            batch_config: report.budget.clone(),
            use_smart_batching: matches!(report.strategy, BatchingStrategy::Smart),
            file_size,
            created_at: now,
            updated_at: now,
            tags,
        }
    }
}

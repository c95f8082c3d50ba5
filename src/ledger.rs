//! The run ledger: per-batch results, statistics, and the final report.
//!
//! The ledger is an append-only `Vec<BatchResult>` owned by the batch loop.
//! Entries are created strictly in range order and never mutated afterwards;
//! a batch's outcome is a tagged variant rather than an exception crossing
//! the loop boundary, so partial success is data, not control flow.
//! [`ProcessingStats`] is the fold over that ledger, extended after each
//! append and finalised with the wall-clock total when the run completes.

use crate::memory::MemoryBudget;
use crate::partition::BatchRange;
use serde::{Deserialize, Serialize};

/// How one batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The engine converted the range; the markdown is kept in the ledger
    /// (it is also already durable in the output sink by the time the entry
    /// is appended).
    Success { markdown: String },
    /// The engine ran and reported a non-success status.
    FailedStatus { status: String },
    /// The engine call itself errored.
    FailedError { message: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }
}

/// One ledger entry: an attempted batch and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// 1-indexed position in the run.
    pub batch_number: u32,
    /// 1-indexed first page, inclusive.
    pub start_page: u32,
    /// 1-indexed last page, inclusive.
    pub end_page: u32,
    /// The range's human label, copied from the plan.
    pub description: String,
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub(crate) fn new(batch_number: u32, range: &BatchRange, outcome: BatchOutcome) -> Self {
        Self {
            batch_number,
            start_page: range.start_page,
            end_page: range.end_page,
            description: range.description.clone(),
            outcome,
        }
    }

    /// Number of pages the batch covered.
    pub fn num_pages(&self) -> u32 {
        self.end_page - self.start_page + 1
    }
}

/// Which partitioner produced the run's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchingStrategy {
    /// Chapter-aligned ranges from the document outline.
    Smart,
    /// Fixed-size ranges.
    Fixed,
}

/// Counters folded over the ledger as the run progresses.
///
/// `processed_pages` counts pages of *successful* batches only, so
/// `processed_pages == Σ num_pages(successful)` and
/// `successful_batches + failed_batches == ledger length` hold at every
/// point of the run, not just at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_pages: u32,
    pub processed_pages: u32,
    pub successful_batches: u32,
    pub failed_batches: u32,
    /// Wall-clock time for the whole run, set when the run completes.
    pub total_duration_ms: u64,
    /// Per-batch wall-clock durations, in run order.
    pub batch_durations_ms: Vec<u64>,
}

impl ProcessingStats {
    pub(crate) fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            ..Self::default()
        }
    }

    /// Extend the fold with one freshly appended ledger entry.
    pub(crate) fn record(&mut self, result: &BatchResult, duration_ms: u64) {
        if result.outcome.is_success() {
            self.successful_batches += 1;
            self.processed_pages += result.num_pages();
        } else {
            self.failed_batches += 1;
        }
        self.batch_durations_ms.push(duration_ms);
    }
}

/// Everything a completed run hands back to the caller.
///
/// Existence of a report means the run completed; how well it went is in
/// the statistics. A run where every batch failed still produces a report;
/// callers that want stricter semantics check `stats.successful_batches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy: BatchingStrategy,
    pub budget: MemoryBudget,
    pub total_pages: u32,
    /// The append-only ledger, in batch order.
    pub batches: Vec<BatchResult>,
    pub stats: ProcessingStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::BatchRange;

    fn range(start: u32, end: u32) -> BatchRange {
        BatchRange::new(start, end, format!("Pages {start}-{end}"))
    }

    fn success(n: u32, start: u32, end: u32) -> BatchResult {
        BatchResult::new(
            n,
            &range(start, end),
            BatchOutcome::Success {
                markdown: "# md".into(),
            },
        )
    }

    #[test]
    fn stats_fold_counts_successes_and_failures() {
        let mut stats = ProcessingStats::new(15);

        stats.record(&success(1, 1, 5), 10);
        stats.record(
            &BatchResult::new(
                2,
                &range(6, 10),
                BatchOutcome::FailedStatus {
                    status: "FAILURE".into(),
                },
            ),
            7,
        );
        stats.record(&success(3, 11, 15), 12);

        assert_eq!(stats.successful_batches, 2);
        assert_eq!(stats.failed_batches, 1);
        assert_eq!(stats.processed_pages, 10);
        assert_eq!(stats.batch_durations_ms, vec![10, 7, 12]);
        assert_eq!(
            stats.successful_batches + stats.failed_batches,
            3,
            "every ledger entry is counted exactly once"
        );
    }

    #[test]
    fn failed_batches_contribute_no_processed_pages() {
        let mut stats = ProcessingStats::new(10);
        stats.record(
            &BatchResult::new(
                1,
                &range(1, 10),
                BatchOutcome::FailedError {
                    message: "engine crashed".into(),
                },
            ),
            3,
        );
        assert_eq!(stats.processed_pages, 0);
        assert_eq!(stats.failed_batches, 1);
    }

    #[test]
    fn batch_result_page_count_is_inclusive() {
        assert_eq!(success(1, 1, 5).num_pages(), 5);
        assert_eq!(success(1, 7, 7).num_pages(), 1);
    }

    #[test]
    fn outcome_serialises_as_tagged_variant() {
        let outcome = BatchOutcome::FailedStatus {
            status: "PARTIAL_SUCCESS".into(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"kind\":\"failed_status\""), "got: {json}");

        let back: BatchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn report_serialises_round_trip() {
        let report = RunReport {
            strategy: BatchingStrategy::Fixed,
            budget: MemoryBudget {
                recommended_batch_size: 42,
                peak_memory_gb: 3.28,
                available_ram_gb: 4.0,
                memory_per_page_mb: 67.8,
                usable_ram_gb: 3.5,
                safety_margin: 0.8,
            },
            total_pages: 10,
            batches: vec![success(1, 1, 5), success(2, 6, 10)],
            stats: ProcessingStats {
                total_pages: 10,
                processed_pages: 10,
                successful_batches: 2,
                failed_batches: 0,
                total_duration_ms: 1234,
                batch_durations_ms: vec![600, 634],
            },
        };

        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats, report.stats);
        assert_eq!(back.batches, report.batches);
    }
}

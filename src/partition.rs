//! Page-range partitioners: fixed-size and outline-aware.
//!
//! Both produce the same thing, an ordered sequence of [`BatchRange`]s that
//! tiles `[1, total_pages]` exactly once with no gaps or overlaps, so the
//! batch loop never cares which strategy built its plan.
//!
//! [`fixed_batches`] is the unconditional fallback: consecutive equal-size
//! ranges with the tail clipped. [`outline_batches`] packs whole chapters
//! into batches up to the size limit, splitting a chapter only when it alone
//! exceeds the limit. An empty result from [`outline_batches`] means "no
//! usable structure"; it is a fallback signal, not an error.

use crate::outline::{chapters, OutlineEntry};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A contiguous, inclusive, 1-indexed page interval with a human label.
///
/// The label is the chapter title(s) the range covers, `"{title} (part)"`
/// for a slice of an oversized chapter, or `"Pages X-Y"` for fixed batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    /// 1-indexed first page.
    pub start_page: u32,
    /// 1-indexed last page, inclusive.
    pub end_page: u32,
    /// Human-readable description of the range's content.
    pub description: String,
}

impl BatchRange {
    pub fn new(start_page: u32, end_page: u32, description: impl Into<String>) -> Self {
        Self {
            start_page,
            end_page,
            description: description.into(),
        }
    }

    /// Number of pages the range spans.
    pub fn num_pages(&self) -> u32 {
        self.end_page - self.start_page + 1
    }
}

/// Partition `[1, total_pages]` into consecutive fixed-size ranges.
///
/// The final range is clipped to `total_pages`. Always succeeds; never empty
/// for `total_pages >= 1`.
pub fn fixed_batches(total_pages: u32, batch_size: u32) -> Vec<BatchRange> {
    debug_assert!(total_pages >= 1 && batch_size >= 1);

    let mut batches = Vec::with_capacity(total_pages.div_ceil(batch_size) as usize);
    let mut start = 1u32;
    while start <= total_pages {
        let end = start.saturating_add(batch_size - 1).min(total_pages);
        batches.push(BatchRange::new(start, end, format!("Pages {start}-{end}")));
        start = end + 1;
    }
    batches
}

/// Partition `[1, total_pages]` along chapter boundaries.
///
/// Chapters are packed greedily into batches of at most `max_batch_size`
/// pages. A single chapter larger than the limit is split on its own into
/// consecutive `"{title} (part)"` sub-ranges, each within the limit; this
/// is the only case where structure yields to size.
///
/// Batch boundaries are defined by page coverage rather than by listed
/// chapter starts, so leading pages before the first marker (a preface, a
/// table of contents) land in the first batch and coverage of
/// `[1, total_pages]` stays complete.
///
/// Returns an empty vec when the outline has no usable markers; the caller
/// falls back to [`fixed_batches`]. Never errors.
pub fn outline_batches(
    entries: &[OutlineEntry],
    total_pages: u32,
    max_batch_size: u32,
) -> Vec<BatchRange> {
    if entries.is_empty() {
        return Vec::new();
    }

    let chapters = chapters(entries, total_pages);
    if chapters.is_empty() {
        return Vec::new();
    }

    let mut batches: Vec<BatchRange> = Vec::new();
    let mut current_start = 1u32;
    let mut pending_titles: Vec<&str> = Vec::new();

    // A pending batch with no chapter titles holds untitled leading pages
    // (cover, preface, TOC); those get the fixed-style label.
    let flush_description = |titles: &[&str], start: u32, end: u32| {
        if titles.is_empty() {
            format!("Pages {start}-{end}")
        } else {
            titles.join(" + ")
        }
    };

    for chapter in &chapters {
        // A chapter that alone exceeds the limit is split by itself.
        if chapter.num_pages() > max_batch_size {
            if chapter.start_page > current_start {
                batches.push(BatchRange::new(
                    current_start,
                    chapter.start_page - 1,
                    flush_description(&pending_titles, current_start, chapter.start_page - 1),
                ));
                pending_titles.clear();
            }

            info!(
                "chapter '{}' spans {} pages, splitting into sub-batches",
                chapter.title,
                chapter.num_pages()
            );
            let mut sub_start = chapter.start_page;
            while sub_start <= chapter.end_page {
                let sub_end = sub_start
                    .saturating_add(max_batch_size - 1)
                    .min(chapter.end_page);
                batches.push(BatchRange::new(
                    sub_start,
                    sub_end,
                    format!("{} (part)", chapter.title),
                ));
                sub_start = sub_end + 1;
            }

            current_start = chapter.end_page + 1;
            continue;
        }

        // Would the pending batch exceed the limit with this chapter folded
        // in? The boundary is deliberately `>`: a batch landing exactly on
        // the limit is kept whole.
        let merged_size = chapter.end_page - current_start + 1;
        if merged_size > max_batch_size {
            batches.push(BatchRange::new(
                current_start,
                chapter.start_page - 1,
                flush_description(&pending_titles, current_start, chapter.start_page - 1),
            ));
            current_start = chapter.start_page;
            pending_titles.clear();
            pending_titles.push(&chapter.title);
        } else {
            pending_titles.push(&chapter.title);
        }
    }

    if !pending_titles.is_empty() {
        batches.push(BatchRange::new(
            current_start,
            total_pages,
            pending_titles.join(" + "),
        ));
    }

    batches
}

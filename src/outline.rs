//! Document outline (bookmark) model and the outline collaborator trait.
//!
//! An outline is the flat list of bookmarks a document carries: each entry
//! has a title, a nesting level (0 = top), and usually a destination page.
//! The smart partitioner turns consecutive same-level entries into
//! [`Chapter`]s whose page ranges tile the document, so batch boundaries can
//! fall on chapter boundaries instead of arbitrary page counts.
//!
//! Outline extraction itself (parsing the document's bookmark tree) belongs
//! to the [`OutlineSource`] collaborator. The library never opens the
//! document; it only consumes the entry list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// One bookmark in a document's outline.
///
/// Pages are 1-indexed. `page` is `None` for entries with no destination
/// (some producers emit structural bookmarks that point nowhere); those are
/// skipped when selecting chapter markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Bookmark title.
    pub title: String,
    /// 1-indexed destination page, if the entry has one.
    pub page: Option<u32>,
    /// Nesting level, 0 = top level.
    pub level: u32,
}

impl OutlineEntry {
    /// Convenience constructor for an entry with a destination page.
    pub fn new(title: impl Into<String>, page: u32, level: u32) -> Self {
        Self {
            title: title.into(),
            page: Some(page),
            level,
        }
    }
}

/// A document section derived from consecutive same-level outline markers.
///
/// `end_page` is the page before the next chapter starts, or the document's
/// last page for the final chapter. Derived, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// 1-indexed first page.
    pub start_page: u32,
    /// 1-indexed last page, inclusive.
    pub end_page: u32,
}

impl Chapter {
    /// Number of pages the chapter spans.
    pub fn num_pages(&self) -> u32 {
        self.end_page - self.start_page + 1
    }
}

/// Select the chapter markers from a flat outline.
///
/// Takes all level-0 entries with a defined page, sorted ascending by page.
/// If there are none, retries with level 1 (some producers nest everything
/// under a single root bookmark). Returns an empty slice-vec when neither
/// level yields markers.
pub fn top_level_markers(entries: &[OutlineEntry]) -> Vec<&OutlineEntry> {
    let at_level = |level: u32| {
        let mut markers: Vec<&OutlineEntry> = entries
            .iter()
            .filter(|e| e.level == level && e.page.is_some())
            .collect();
        markers.sort_by_key(|e| e.page);
        markers
    };

    let markers = at_level(0);
    if !markers.is_empty() {
        return markers;
    }
    tracing::debug!("no level-0 chapter markers, trying level 1");
    at_level(1)
}

/// Derive the chapter table from an outline.
///
/// Each chapter ends where the next one starts; the last chapter runs to
/// `total_pages`. Degenerate chapters are dropped: a marker sharing its page
/// with the next marker spans no pages, and a marker past `total_pages`
/// points outside the document. Returns an empty vec when the outline has
/// no usable markers.
pub fn chapters(entries: &[OutlineEntry], total_pages: u32) -> Vec<Chapter> {
    let markers = top_level_markers(entries);

    markers
        .iter()
        .enumerate()
        .filter_map(|(i, marker)| {
            let start_page = marker.page?;
            let end_page = match markers.get(i + 1).and_then(|next| next.page) {
                Some(next_start) => next_start.checked_sub(1)?.min(total_pages),
                None => total_pages,
            };
            if end_page < start_page {
                return None;
            }
            Some(Chapter {
                title: marker.title.clone(),
                start_page,
                end_page,
            })
        })
        .collect()
}

/// Error from the outline collaborator.
///
/// Never fatal to a run: the processor catches it, logs a warning, and falls
/// back to fixed-size batching.
#[derive(Debug, Error)]
#[error("outline extraction failed: {0}")]
pub struct OutlineError(pub String);

/// Collaborator that reads document structure without converting anything.
///
/// Both operations are metadata-only and expected to be cheap compared to a
/// conversion call. Implementations wrap whatever document library the host
/// uses; tests use scripted fakes.
#[async_trait]
pub trait OutlineSource: Send + Sync {
    /// The document's flat outline, empty if it has none.
    async fn outline(&self, doc: &Path) -> Result<Vec<OutlineEntry>, OutlineError>;

    /// Total number of pages in the document.
    async fn page_count(&self, doc: &Path) -> Result<u32, OutlineError>;
}

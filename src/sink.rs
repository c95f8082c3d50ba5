//! Append-only Markdown output sink.
//!
//! The sink is the durable half of the run: every batch's content (or its
//! failure marker) is written and flushed before the next batch starts, so a
//! crash mid-run loses at most the batch in flight, never completed work.
//! No partial batch content is ever written: a batch reaches the sink as
//! one write group or not at all.
//!
//! Layout, fixed:
//!
//! ```text
//! # {document name}
//!
//! Converted: {ISO-8601 timestamp}
//!
//! Total Pages: {n}
//!
//! Maximum Batch Size: {n}
//!
//! Smart Batching: {true|false}
//!
//! ---
//!
//! <!-- Batch 1: Pages 1-10 - Chapter 1 + Chapter 2 -->
//!
//! {markdown}
//!
//! ---
//!
//! <!-- BATCH 2 FAILED: FAILURE -->
//! ```

use crate::error::BatchError;
use crate::partition::BatchRange;
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run metadata written once at the top of the sink.
#[derive(Debug, Clone)]
pub struct RunHeader {
    /// Document display name, usually the source file name.
    pub document_name: String,
    pub total_pages: u32,
    pub max_batch_size: u32,
    pub smart_batching: bool,
}

/// Writes the run's output stream in the fixed layout above.
///
/// Generic over `std::io::Write`; the processor wraps a buffered file, tests
/// wrap a `Vec<u8>`. Every public method ends in a flush. The `path` is kept
/// only for error messages.
pub struct MarkdownSink<W: Write> {
    writer: W,
    path: PathBuf,
}

impl<W: Write> MarkdownSink<W> {
    pub fn new(writer: W, path: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            path: path.into(),
        }
    }

    /// Consume the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> BatchError {
        BatchError::OutputWriteFailed {
            path: self.path.clone(),
            source,
        }
    }

    fn flush(&mut self) -> Result<(), BatchError> {
        self.writer.flush().map_err(|e| self.io_err(e))
    }

    /// Write the document header block and the opening separator.
    pub fn write_run_header(&mut self, header: &RunHeader) -> Result<(), BatchError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let block = format!(
            "# {name}\n\n\
             Converted: {timestamp}\n\n\
             Total Pages: {pages}\n\n\
             Maximum Batch Size: {batch}\n\n\
             Smart Batching: {smart}\n\n\
             ---\n\n",
            name = header.document_name,
            pages = header.total_pages,
            batch = header.max_batch_size,
            smart = header.smart_batching,
        );
        self.writer
            .write_all(block.as_bytes())
            .map_err(|e| self.io_err(e))?;
        self.flush()
    }

    /// Write one successful batch: marker, markdown, trailing separator.
    pub fn write_batch(
        &mut self,
        batch_number: u32,
        range: &BatchRange,
        markdown: &str,
    ) -> Result<(), BatchError> {
        let block = format!(
            "\n<!-- Batch {n}: Pages {start}-{end} - {desc} -->\n\n{markdown}\n\n---\n\n",
            n = batch_number,
            start = range.start_page,
            end = range.end_page,
            desc = range.description,
        );
        self.writer
            .write_all(block.as_bytes())
            .map_err(|e| self.io_err(e))?;
        self.flush()
    }

    /// Write the marker for a batch the engine reported as failed.
    pub fn write_failed_status(
        &mut self,
        batch_number: u32,
        status: &str,
    ) -> Result<(), BatchError> {
        let block = format!("\n<!-- BATCH {batch_number} FAILED: {status} -->\n\n");
        self.writer
            .write_all(block.as_bytes())
            .map_err(|e| self.io_err(e))?;
        self.flush()
    }

    /// Write the marker for a batch whose engine call errored.
    pub fn write_failed_error(
        &mut self,
        batch_number: u32,
        message: &str,
    ) -> Result<(), BatchError> {
        let block = format!("\n<!-- BATCH {batch_number} ERROR: {message} -->\n\n");
        self.writer
            .write_all(block.as_bytes())
            .map_err(|e| self.io_err(e))?;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> MarkdownSink<Vec<u8>> {
        MarkdownSink::new(Vec::new(), "/test/out.md")
    }

    fn header() -> RunHeader {
        RunHeader {
            document_name: "core_rulebook.pdf".into(),
            total_pages: 576,
            max_batch_size: 42,
            smart_batching: true,
        }
    }

    #[test]
    fn header_contains_all_metadata_lines() {
        let mut s = sink();
        s.write_run_header(&header()).unwrap();
        let out = String::from_utf8(s.into_inner()).unwrap();

        assert!(out.starts_with("# core_rulebook.pdf\n\n"));
        assert!(out.contains("Converted: "));
        assert!(out.contains("Total Pages: 576\n"));
        assert!(out.contains("Maximum Batch Size: 42\n"));
        assert!(out.contains("Smart Batching: true\n"));
        assert!(out.ends_with("---\n\n"));
    }

    #[test]
    fn header_timestamp_is_iso8601_utc() {
        let mut s = sink();
        s.write_run_header(&header()).unwrap();
        let out = String::from_utf8(s.into_inner()).unwrap();

        let line = out
            .lines()
            .find(|l| l.starts_with("Converted: "))
            .expect("timestamp line present");
        let stamp = line.trim_start_matches("Converted: ");
        assert!(
            chrono::DateTime::parse_from_rfc3339(stamp).is_ok(),
            "not RFC 3339: {stamp}"
        );
    }

    #[test]
    fn batch_block_has_marker_content_and_separator() {
        let mut s = sink();
        let range = BatchRange::new(1, 10, "Chapter 1 + Chapter 2");
        s.write_batch(1, &range, "# Chapter 1\n\nBody.").unwrap();
        let out = String::from_utf8(s.into_inner()).unwrap();

        assert!(out.contains("<!-- Batch 1: Pages 1-10 - Chapter 1 + Chapter 2 -->"));
        assert!(out.contains("# Chapter 1\n\nBody."));
        assert!(out.trim_end().ends_with("---"));
    }

    #[test]
    fn failure_markers_identify_batch_and_cause() {
        let mut s = sink();
        s.write_failed_status(2, "FAILURE").unwrap();
        s.write_failed_error(3, "segfault in layout model").unwrap();
        let out = String::from_utf8(s.into_inner()).unwrap();

        assert!(out.contains("<!-- BATCH 2 FAILED: FAILURE -->"));
        assert!(out.contains("<!-- BATCH 3 ERROR: segfault in layout model -->"));
    }

    #[test]
    fn write_failure_surfaces_path_in_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut s = MarkdownSink::new(Broken, "/data/out.md");
        let err = s.write_failed_status(1, "FAILURE").unwrap_err();
        assert!(err.to_string().contains("/data/out.md"), "got: {err}");
    }
}

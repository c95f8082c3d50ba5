//! Configuration for a batched conversion run.
//!
//! Every knob lives in [`BatchingConfig`], built via its
//! [`BatchingConfigBuilder`]. Keeping the whole memory model in one struct
//! makes it trivial to log, diff two runs to understand why their batch
//! plans differ, and share a config across documents.
//!
//! # Design choice: builder over constructor
//! The memory model alone has six interacting parameters; a positional
//! constructor invites swapped arguments. The builder lets callers set only
//! what they care about and rely on documented defaults for the rest.

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for batched document conversion.
///
/// Built via [`BatchingConfig::builder()`] or
/// [`BatchingConfig::default()`].
///
/// # Example
/// ```rust
/// use pagebatch::BatchingConfig;
///
/// let config = BatchingConfig::builder()
///     .memory_per_page_mb(35.0)   // text-heavy corpus
///     .max_batch_size(200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchingConfig {
    /// Available RAM in GB. `None` (the default) probes the host at run
    /// start; servers with their own memory accounting pin it explicitly.
    pub available_memory_gb: Option<f64>,

    /// Estimated engine memory per page in MB. Default: 67.8.
    ///
    /// Empirical figure for table-heavy documents. Use 30–50 for text-heavy
    /// corpora, 80–150 for image-heavy scans. Overshooting wastes batches;
    /// undershooting risks the OOM this crate exists to prevent.
    pub memory_per_page_mb: f64,

    /// Baseline engine overhead in GB (models, runtime). Default: 0.5.
    pub overhead_gb: f64,

    /// Fraction of the theoretical page maximum actually used. Default: 0.8.
    ///
    /// Per-page memory is an estimate; the margin absorbs pages that run
    /// hotter than the average. Must be in (0, 1].
    pub safety_margin: f64,

    /// Lower clamp on the recommended batch size. Default: 1.
    pub min_batch_size: u32,

    /// Upper clamp on the recommended batch size. Default: 500.
    pub max_batch_size: u32,

    /// Split batches at chapter boundaries when the document has a usable
    /// outline. Default: true.
    ///
    /// Chapter-aligned batches keep headings and their body text in the same
    /// engine call, which noticeably improves structure detection at batch
    /// seams. Falls back to fixed-size batching automatically.
    pub use_smart_batching: bool,

    /// Progress callback for per-batch events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            available_memory_gb: None,
            memory_per_page_mb: 67.8,
            overhead_gb: 0.5,
            safety_margin: 0.8,
            min_batch_size: 1,
            max_batch_size: 500,
            use_smart_batching: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchingConfig")
            .field("available_memory_gb", &self.available_memory_gb)
            .field("memory_per_page_mb", &self.memory_per_page_mb)
            .field("overhead_gb", &self.overhead_gb)
            .field("safety_margin", &self.safety_margin)
            .field("min_batch_size", &self.min_batch_size)
            .field("max_batch_size", &self.max_batch_size)
            .field("use_smart_batching", &self.use_smart_batching)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl BatchingConfig {
    /// Create a new builder for `BatchingConfig`.
    pub fn builder() -> BatchingConfigBuilder {
        BatchingConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchingConfig`].
#[derive(Debug)]
pub struct BatchingConfigBuilder {
    config: BatchingConfig,
}

impl BatchingConfigBuilder {
    /// Pin available memory instead of probing the host.
    pub fn available_memory_gb(mut self, gb: f64) -> Self {
        self.config.available_memory_gb = Some(gb);
        self
    }

    pub fn memory_per_page_mb(mut self, mb: f64) -> Self {
        self.config.memory_per_page_mb = mb;
        self
    }

    pub fn overhead_gb(mut self, gb: f64) -> Self {
        self.config.overhead_gb = gb.max(0.0);
        self
    }

    pub fn safety_margin(mut self, margin: f64) -> Self {
        self.config.safety_margin = margin;
        self
    }

    pub fn min_batch_size(mut self, pages: u32) -> Self {
        self.config.min_batch_size = pages.max(1);
        self
    }

    pub fn max_batch_size(mut self, pages: u32) -> Self {
        self.config.max_batch_size = pages.max(1);
        self
    }

    pub fn use_smart_batching(mut self, v: bool) -> Self {
        self.config.use_smart_batching = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchingConfig, BatchError> {
        let c = &self.config;
        if c.memory_per_page_mb <= 0.0 {
            return Err(BatchError::InvalidConfig(format!(
                "memory_per_page_mb must be positive, got {}",
                c.memory_per_page_mb
            )));
        }
        if !(c.safety_margin > 0.0 && c.safety_margin <= 1.0) {
            return Err(BatchError::InvalidConfig(format!(
                "safety_margin must be in (0, 1], got {}",
                c.safety_margin
            )));
        }
        if c.min_batch_size > c.max_batch_size {
            return Err(BatchError::InvalidConfig(format!(
                "min_batch_size ({}) exceeds max_batch_size ({})",
                c.min_batch_size, c.max_batch_size
            )));
        }
        if let Some(gb) = c.available_memory_gb {
            if gb <= 0.0 {
                return Err(BatchError::InvalidConfig(format!(
                    "available_memory_gb must be positive, got {gb}"
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = BatchingConfig::default();
        assert_eq!(c.available_memory_gb, None);
        assert_eq!(c.memory_per_page_mb, 67.8);
        assert_eq!(c.overhead_gb, 0.5);
        assert_eq!(c.safety_margin, 0.8);
        assert_eq!(c.min_batch_size, 1);
        assert_eq!(c.max_batch_size, 500);
        assert!(c.use_smart_batching);
    }

    #[test]
    fn builder_rejects_zero_safety_margin() {
        let err = BatchingConfig::builder()
            .safety_margin(0.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("safety_margin"));
    }

    #[test]
    fn builder_rejects_margin_above_one() {
        assert!(BatchingConfig::builder().safety_margin(1.2).build().is_err());
        assert!(BatchingConfig::builder().safety_margin(1.0).build().is_ok());
    }

    #[test]
    fn builder_rejects_inverted_batch_bounds() {
        let err = BatchingConfig::builder()
            .min_batch_size(100)
            .max_batch_size(10)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_batch_size"));
    }

    #[test]
    fn builder_rejects_nonpositive_page_memory() {
        assert!(BatchingConfig::builder()
            .memory_per_page_mb(0.0)
            .build()
            .is_err());
    }

    #[test]
    fn batch_size_setters_clamp_to_one() {
        let c = BatchingConfig::builder()
            .min_batch_size(0)
            .max_batch_size(0)
            .build()
            .unwrap();
        assert_eq!(c.min_batch_size, 1);
        assert_eq!(c.max_batch_size, 1);
    }

    #[test]
    fn debug_elides_the_callback() {
        use crate::progress::NoopProgressCallback;
        use std::sync::Arc;

        let c = BatchingConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn callback>"), "got: {dbg}");
    }
}

//! Memory-budget estimation: how many pages fit in one batch.
//!
//! The conversion engine holds an entire batch's working set in memory at
//! once, so the batch size *is* the memory ceiling. The estimator turns a
//! per-page memory figure and the host's available RAM into a recommended
//! batch size:
//!
//! ```text
//! usable      = available - overhead          (engine models, runtime)
//! theoretical = usable_mb / memory_per_page
//! safe        = theoretical × safety_margin
//! recommended = clamp(⌊safe⌋, min, max)
//! ```
//!
//! The per-page figure is empirical and document-dependent: table-heavy
//! documents run around 67.8 MB/page (the default), plain text 30–50 MB,
//! image-heavy scans 80–150 MB. Callers tune it per corpus via
//! [`crate::config::BatchingConfigBuilder::memory_per_page_mb`].
//!
//! Host memory is read through the [`MemoryProbe`] trait so servers can pin
//! an explicit figure and tests can inject fixed values; the default
//! [`SystemMemoryProbe`] asks the OS.

use crate::config::BatchingConfig;
use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Reserved for the OS and other processes when probing, in GB.
const SYSTEM_RESERVE_GB: f64 = 1.0;

/// Lower bound on what a probe may report, in GB.
const PROBE_FLOOR_GB: f64 = 0.5;

/// The memory plan computed once at the start of a document run.
///
/// Immutable after computation; folded into the persisted
/// [`crate::record::DocumentRecord`] so a run's sizing decisions stay
/// auditable after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBudget {
    /// Pages per batch the host can safely sustain.
    pub recommended_batch_size: u32,
    /// Expected peak memory at that batch size, in GB.
    pub peak_memory_gb: f64,
    /// Available RAM the estimate was based on, in GB.
    pub available_ram_gb: f64,
    /// Per-page memory figure used in the calculation, in MB.
    pub memory_per_page_mb: f64,
    /// Available RAM minus engine overhead, in GB.
    pub usable_ram_gb: f64,
    /// Fraction of the theoretical maximum actually used.
    pub safety_margin: f64,
}

/// Host memory probe.
///
/// Only consulted when the config does not pin `available_memory_gb`
/// explicitly. The sole side-effectful input to the estimator.
pub trait MemoryProbe: Send + Sync {
    /// Memory that can safely be used without pushing the host into swap,
    /// in GB.
    fn available_gb(&self) -> f64;
}

/// Probe backed by the operating system's view of available memory.
///
/// Reports available (not total) memory to account for the OS and other
/// processes, keeps [`SYSTEM_RESERVE_GB`] back for system operations, and
/// never reports less than [`PROBE_FLOOR_GB`].
#[derive(Debug, Default)]
pub struct SystemMemoryProbe;

impl MemoryProbe for SystemMemoryProbe {
    fn available_gb(&self) -> f64 {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let available = sys.available_memory() as f64 / BYTES_PER_GIB - SYSTEM_RESERVE_GB;
        available.max(PROBE_FLOOR_GB)
    }
}

/// Probe that always reports a fixed figure. Useful in tests and in hosts
/// that manage memory accounting themselves (containers with cgroup limits).
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub f64);

impl MemoryProbe for FixedMemoryProbe {
    fn available_gb(&self) -> f64 {
        self.0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute the memory budget for one document run.
///
/// Deterministic given an explicit `available_memory_gb` in the config; the
/// probe is only consulted when that field is unset. Monotonic: more
/// available memory or a smaller per-page figure never lowers the
/// recommendation (subject to the min/max clamp).
///
/// # Errors
/// [`BatchError::InsufficientMemory`] when the engine overhead alone exceeds
/// available memory. Fatal, raised before any partitioning or conversion.
pub fn estimate_batch_size(
    config: &BatchingConfig,
    probe: &dyn MemoryProbe,
) -> Result<MemoryBudget, BatchError> {
    let available_gb = match config.available_memory_gb {
        Some(gb) => gb,
        None => {
            let probed = probe.available_gb();
            debug!("memory probe reports {probed:.2} GB available");
            probed
        }
    };

    let usable_gb = available_gb - config.overhead_gb;
    if usable_gb <= 0.0 {
        return Err(BatchError::InsufficientMemory {
            available_gb,
            required_gb: config.overhead_gb,
        });
    }

    let theoretical_max_pages = usable_gb * 1024.0 / config.memory_per_page_mb;
    let safe_max_pages = theoretical_max_pages * config.safety_margin;

    let recommended_batch_size =
        (safe_max_pages as u32).clamp(config.min_batch_size, config.max_batch_size);

    let peak_memory_gb =
        config.overhead_gb + f64::from(recommended_batch_size) * config.memory_per_page_mb / 1024.0;

    Ok(MemoryBudget {
        recommended_batch_size,
        peak_memory_gb: round2(peak_memory_gb),
        available_ram_gb: round2(available_gb),
        memory_per_page_mb: config.memory_per_page_mb,
        usable_ram_gb: round2(usable_gb),
        safety_margin: config.safety_margin,
    })
}

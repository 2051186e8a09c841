//! Crate-wide error type.
//!
//! Every fallible public entry point returns [`PopsError`]. Variants carry
//! enough context (cell coordinates, offending quantity, the bound it
//! violated) that a caller can log a useful message without re-deriving it.

use thiserror::Error;

use crate::kernels::DispersalKernelType;

/// The six error kinds the engine can raise.
#[derive(Debug, Error)]
pub enum PopsError {
    /// Impossible dates, missing keys, inconsistent latency/exposed-vector
    /// length, a schedule `use_X` flag set without its companion parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A runtime invariant (I1-I6) was violated.
    #[error("invariant violation at ({row}, {col}): {detail}")]
    InvariantViolation {
        row: i32,
        col: i32,
        detail: String,
    },

    /// A kernel was asked to produce a target for a kernel type it does not
    /// implement.
    #[error("kernel {kernel:?} does not support dispersal type {requested:?}")]
    UnsupportedKernel {
        kernel: &'static str,
        requested: DispersalKernelType,
    },

    /// Node ids below 1, no nodes inside the bounding box when
    /// `allow_empty` is false, or a network-kernel call from a cell with no
    /// node.
    #[error("network error: {0}")]
    Network(String),

    /// A schedule mask or derived schedule was accessed before the owning
    /// scheduler/feature was finalized (I7).
    #[error("schedule '{0}' accessed before it was built")]
    ScheduleNotBuilt(&'static str),

    /// Aggregating spread-rate/quarantine statistics across zero runs.
    #[error("statistics error: {0}")]
    Statistics(String),
}

pub type Result<T> = std::result::Result<T, PopsError>;

//! Dispersal kernel family: callable objects that, given a generator and a
//! source cell, return a target cell (possibly outside the grid).
//!
//! SPEC_FULL.md DESIGN NOTES: modeled as "an interface with two methods
//! (`sample`, `is_eligible`)" rather than the source's deeply templated
//! class hierarchy (`RadialDispersalKernel<IntegerRaster>`, `SwitchKernel`,
//! ...) — grounded in the object-safe `Propagator` trait pattern from
//! `16cb93ef_tachyon-beep-murk__crates-murk-propagator-src-propagator.rs.rs`
//! (one trait, `Box<dyn Trait>` composition, no generic type parameter
//! threading through every caller).

pub mod deterministic;
pub mod factory;
pub mod natural_anthropogenic;
pub mod neighbor;
pub mod network;
pub mod radial;
pub mod uniform;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The full kernel-type enumeration (radial family members plus the three
/// non-radial kernels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispersalKernelType {
    Cauchy,
    Exponential,
    Weibull,
    LogNormal,
    Normal,
    PowerLaw,
    HyperbolicSecant,
    Logistic,
    Gamma,
    ExponentialPower,
    Uniform,
    DeterministicNeighbor,
    Network,
}

impl DispersalKernelType {
    pub fn is_radial(&self) -> bool {
        !matches!(
            self,
            DispersalKernelType::Uniform | DispersalKernelType::DeterministicNeighbor | DispersalKernelType::Network
        )
    }
}

/// A target cell a kernel produced, expressed in raster row/col space. May
/// lie outside `[0,rows) x [0,cols)` — the caller (spread action) is
/// responsible for checking and recording the outside-disperser event.
pub type Target = (i32, i32);

/// Common interface every kernel implements. Object-safe (`&mut dyn
/// RngCore` instead of a generic `Generator` parameter) so the
/// natural/anthropogenic selector can hold two arbitrary kernels behind
/// `Box<dyn Kernel>`.
pub trait Kernel {
    /// Produce a target cell for a disperser leaving `(row, col)`.
    fn disperse(&mut self, rng: &mut dyn RngCore, row: i32, col: i32) -> Target;

    /// True when this kernel can originate a disperser at `(row, col)`.
    /// Every kernel except the network kernel is eligible everywhere.
    fn is_cell_eligible(&self, row: i32, col: i32) -> bool {
        let _ = (row, col);
        true
    }
}

//! Deterministic probability-mass kernel.
//!
//! Grounded in the corrected `include/pops/deterministic_kernel.hpp` (Q4 in
//! DESIGN.md: the legacy flat `deterministic_kernel.hpp` mixed absolute and
//! window-relative indices when comparing/copying probabilities; this port
//! keeps every index in window-relative space and converts to absolute
//! row/col only at the return boundary).
//!
//! The kernel must be reconstructed whenever the `dispersers` raster it
//! holds a handle to is reallocated (SPEC_FULL.md DESIGN NOTES); this is
//! modeled with `Rc<RefCell<...>>` rather than a borrowed reference because
//! the kernel is held inside a `Box<dyn Kernel>` for the lifetime of a
//! simulation run and reborrowing through that trait object each step is
//! not expressible with a plain lifetime.

use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;

use crate::distributions::RadialDistribution;
use crate::kernels::{Kernel, Target};
use crate::raster::Raster;

pub struct DeterministicKernel {
    distribution: RadialDistribution,
    ns_res: f64,
    ew_res: f64,
    /// Half-extent of the probability window in rows/cols.
    half_rows: i32,
    half_cols: i32,
    /// Normalized probability mass, `(2*half_rows+1) x (2*half_cols+1)`,
    /// window-relative (index `[0][0]` is the window's north-west corner).
    base_matrix: Vec<Vec<f64>>,
    /// Working copy for the currently active source cell; reset whenever
    /// the source cell changes.
    working_matrix: Option<Vec<Vec<f64>>>,
    current_source: Option<(i32, i32)>,
    /// `1 / dispersers(source_row, source_col)`, computed once per source
    /// cell and subtracted from the argmax cell on every call, so the same
    /// proportion of individuals moves regardless of how many are
    /// dispersing from that source.
    proportion_of_dispersers: f64,
    dispersers: Rc<RefCell<Raster<i32>>>,
}

impl DeterministicKernel {
    pub fn new(
        distribution: RadialDistribution,
        dispersal_percentage: f64,
        ns_res: f64,
        ew_res: f64,
        dispersers: Rc<RefCell<Raster<i32>>>,
    ) -> DeterministicKernel {
        let max_distance = distribution.icdf(dispersal_percentage);
        let half_rows = (max_distance / ns_res).ceil() as i32;
        let half_cols = (max_distance / ew_res).ceil() as i32;
        let window_rows = (2 * half_rows + 1) as usize;
        let window_cols = (2 * half_cols + 1) as usize;

        let mut matrix = vec![vec![0.0; window_cols]; window_rows];
        let mut sum = 0.0;
        for (wr, row) in matrix.iter_mut().enumerate() {
            for (wc, value) in row.iter_mut().enumerate() {
                let dr = wr as i32 - half_rows;
                let dc = wc as i32 - half_cols;
                let dist = ((dr as f64 * ns_res).powi(2) + (dc as f64 * ew_res).powi(2)).sqrt();
                let p = distribution.pdf(dist).abs();
                *value = p;
                sum += p;
            }
        }
        if sum > 0.0 {
            for row in matrix.iter_mut() {
                for v in row.iter_mut() {
                    *v /= sum;
                }
            }
        }

        DeterministicKernel {
            distribution,
            ns_res,
            ew_res,
            half_rows,
            half_cols,
            base_matrix: matrix,
            working_matrix: None,
            current_source: None,
            proportion_of_dispersers: 0.0,
            dispersers,
        }
    }

    fn reset_if_new_source(&mut self, row: i32, col: i32) {
        if self.current_source != Some((row, col)) {
            self.working_matrix = Some(self.base_matrix.clone());
            self.current_source = Some((row, col));
            let n = *self.dispersers.borrow().get(row as usize, col as usize);
            self.proportion_of_dispersers = 1.0 / n as f64;
        }
    }

    fn argmax_window(matrix: &[Vec<f64>]) -> (usize, usize) {
        let mut best = (0usize, 0usize);
        let mut best_value = f64::MIN;
        for (wr, row) in matrix.iter().enumerate() {
            for (wc, &v) in row.iter().enumerate() {
                if v > best_value {
                    best_value = v;
                    best = (wr, wc);
                }
            }
        }
        best
    }
}

impl Kernel for DeterministicKernel {
    fn disperse(&mut self, _rng: &mut dyn RngCore, row: i32, col: i32) -> Target {
        self.reset_if_new_source(row, col);
        let matrix = self.working_matrix.as_mut().expect("reset_if_new_source always sets it");
        let (wr, wc) = Self::argmax_window(matrix);
        let out_row = row + (wr as i32 - self.half_rows);
        let out_col = col + (wc as i32 - self.half_cols);

        matrix[wr][wc] -= self.proportion_of_dispersers;
        (out_row, out_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn resets_working_matrix_on_new_source() {
        let dispersers = Rc::new(RefCell::new(Raster::filled(5, 5, 30.0, 30.0, 10)));
        let mut k = DeterministicKernel::new(
            RadialDistribution::Cauchy { s: 0.9 },
            0.9,
            30.0,
            30.0,
            dispersers,
        );
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let first = k.disperse(&mut rng, 2, 2);
        assert_eq!(first, (2, 2), "highest-probability cell for a symmetric kernel is the source itself");
        let second = k.disperse(&mut rng, 2, 2);
        assert_ne!(first, second, "mass should have shifted off the exhausted peak cell");
    }
}

//! Soil reservoir: a per-cell buried-disperser buffer.
//!
//! Grounded in the spread action's step 1/3 soil split-off/draw-back and
//! supplemented from `include/pops/soils.hpp`'s `SoilPool`, reduced here (per
//! SPEC_FULL.md §4.5) to the single-layer buffer the distilled spec actually
//! describes: no decay curve beyond the per-step draw fraction.

use std::collections::HashMap;

use rand::RngCore;

/// Buried disperser counts, keyed by suitable cell. Cells never deposited to
/// are simply absent (equivalent to zero).
#[derive(Debug, Clone, Default)]
pub struct SoilPool {
    buried: HashMap<(usize, usize), i32>,
    /// Fraction of a cell's buried dispersers drawn back out each step.
    draw_fraction: f64,
}

impl SoilPool {
    pub fn new(draw_fraction: f64) -> SoilPool {
        SoilPool {
            buried: HashMap::new(),
            draw_fraction: draw_fraction.clamp(0.0, 1.0),
        }
    }

    /// Bury `n` dispersers generated at `(row, col)`.
    pub fn deposit(&mut self, row: usize, col: usize, n: i32) {
        if n <= 0 {
            return;
        }
        *self.buried.entry((row, col)).or_insert(0) += n;
    }

    pub fn buried_at(&self, row: usize, col: usize) -> i32 {
        *self.buried.get(&(row, col)).unwrap_or(&0)
    }

    /// Draw back `draw_fraction` of the buried count at `(row, col)`
    /// (rounded, stochastically split at the boundary), removing the drawn
    /// amount from the reservoir.
    pub fn draw_out(&mut self, row: usize, col: usize, rng: &mut dyn RngCore) -> i32 {
        let remaining = self.buried.get(&(row, col)).copied().unwrap_or(0);
        if remaining == 0 {
            return 0;
        }
        let exact = self.draw_fraction * remaining as f64;
        let floor = exact.floor();
        let frac = exact - floor;
        use rand::Rng;
        let mut drawn = floor as i32;
        if frac > 0.0 && rng.gen_range(0.0..1.0) < frac {
            drawn += 1;
        }
        drawn = drawn.min(remaining);
        if drawn > 0 {
            let left = remaining - drawn;
            if left == 0 {
                self.buried.remove(&(row, col));
            } else {
                self.buried.insert((row, col), left);
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deposit_and_draw_out_respects_fraction() {
        let mut soil = SoilPool::new(0.5);
        soil.deposit(1, 1, 10);
        let mut rng = StdRng::seed_from_u64(3);
        let drawn = soil.draw_out(1, 1, &mut rng);
        assert!(drawn <= 10);
        assert_eq!(soil.buried_at(1, 1), 10 - drawn);
    }

    #[test]
    fn draw_out_empty_cell_returns_zero() {
        let mut soil = SoilPool::new(0.5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(soil.draw_out(0, 0, &mut rng), 0);
    }
}

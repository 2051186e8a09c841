//! The S/E/I/R compartment arrays with cohort-structured exposed and
//! mortality vectors, and every local state mutation the engine performs.
//!
//! Grounded in `include/pops/host_pool.hpp`. Cohort vectors are
//! `VecDeque<i32>` per cell (SPEC_FULL.md DESIGN NOTES: O(1) age-by-one,
//! drain-oldest, no per-step allocation) instead of the source's
//! vector-of-vectors rotated by `std::rotate`.
//!
//! **Deviation from source, recorded here and in DESIGN.md.** The source's
//! `total_hosts_at()` returns only `susceptible_at + infected_at`, omitting
//! exposed and resistant counts. That contradicts invariant I2
//! (`total = S + sum(E) + I + R`), which every other part of this
//! specification (and the source's own mortality bookkeeping, which
//! subtracts killed hosts from `total_hosts` alongside `I`) assumes holds.
//! This port treats I2 as authoritative and maintains `total_hosts` as
//! `S + sum(E) + I + R` incrementally through every mutator.

use std::collections::VecDeque;

use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;
use rand_distr::Poisson;

use crate::config::ModelType;
use crate::environment::Environment;
use crate::error::{PopsError, Result};
use crate::raster::Raster;

/// Per-call establishment parameters (pulled out of `Config` by the
/// spread action so `HostPool` stays config-agnostic).
#[derive(Debug, Clone, Copy)]
pub struct EstablishmentParams {
    pub stochastic: bool,
    pub probability: f64,
    pub competency: f64,
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub reproductive_rate: f64,
    pub stochastic: bool,
    pub competency: f64,
}

struct Cell {
    susceptible: i32,
    infected: i32,
    resistant: i32,
    exposed: VecDeque<i32>,
    mortality: VecDeque<i32>,
    died: i32,
}

impl Cell {
    fn new(susceptible: i32, infected: i32, exposed_len: usize, mortality_len: usize) -> Cell {
        Cell {
            susceptible,
            infected,
            resistant: 0,
            exposed: VecDeque::from(vec![0; exposed_len]),
            mortality: VecDeque::from(vec![0; mortality_len]),
            died: 0,
        }
    }

    fn exposed_total(&self) -> i32 {
        self.exposed.iter().sum()
    }

    fn total_hosts(&self) -> i32 {
        self.susceptible + self.exposed_total() + self.infected + self.resistant
    }
}

/// The S/E/I/R compartment state for every cell, plus the suitable-cells
/// index.
pub struct HostPool {
    rows: usize,
    cols: usize,
    model_type: ModelType,
    exposed_len: usize,
    mortality_len: usize,
    cells: Vec<Cell>,
    total_population: Raster<i32>,
    suitable_cells: Vec<(usize, usize)>,
    suitable_lookup: std::collections::HashSet<(usize, usize)>,
}

impl HostPool {
    pub fn new(
        model_type: ModelType,
        exposed_len: usize,
        mortality_len: usize,
        susceptible: &Raster<i32>,
        infected: &Raster<i32>,
        total_population: Raster<i32>,
    ) -> Result<HostPool> {
        if model_type == ModelType::Sei && exposed_len == 0 {
            return Err(PopsError::Configuration(
                "SEI model requires a non-empty exposed cohort vector".into(),
            ));
        }
        let rows = susceptible.rows();
        let cols = susceptible.cols();
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, c, &s) in susceptible.iter_cells() {
            let i = *infected.get(r, c);
            cells.push(Cell::new(s, i, exposed_len.max(1), mortality_len.max(1)));
        }
        let suitable_cells = total_population.find_suitable_cells();
        let suitable_lookup = suitable_cells.iter().copied().collect();
        Ok(HostPool {
            rows,
            cols,
            model_type,
            exposed_len: exposed_len.max(1),
            mortality_len: mortality_len.max(1),
            cells,
            total_population,
            suitable_cells,
            suitable_lookup,
        })
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn suitable_cells(&self) -> &[(usize, usize)] {
        &self.suitable_cells
    }

    fn mark_suitable(&mut self, row: usize, col: usize) {
        if self.suitable_lookup.insert((row, col)) {
            self.suitable_cells.push((row, col));
        }
    }

    pub fn susceptible_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].susceptible
    }

    pub fn infected_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].infected
    }

    pub fn resistant_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].resistant
    }

    pub fn exposed_at(&self, row: usize, col: usize) -> &VecDeque<i32> {
        &self.cells[self.index(row, col)].exposed
    }

    pub fn computed_exposed_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].exposed_total()
    }

    pub fn mortality_by_group_at(&self, row: usize, col: usize) -> &VecDeque<i32> {
        &self.cells[self.index(row, col)].mortality
    }

    pub fn total_hosts_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].total_hosts()
    }

    pub fn died_at(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)].died
    }

    /// `disperser_to`: commit a disperser arrival if establishment
    /// succeeds. Returns `false` (not an error) when `S=0` or the
    /// stochastic/deterministic establishment test fails.
    pub fn disperser_to(
        &mut self,
        row: usize,
        col: usize,
        rng: &mut dyn RngCore,
        env: &Environment,
        params: EstablishmentParams,
    ) -> Result<bool> {
        let idx = self.index(row, col);
        if self.cells[idx].susceptible == 0 {
            return Ok(false);
        }
        let total_population = *self.total_population.get(row, col);
        if total_population == 0 {
            return Ok(false);
        }
        let p = (self.cells[idx].susceptible as f64 / total_population as f64)
            * env.weather_at(row, col)
            * params.competency;
        let u = if params.stochastic {
            use rand::Rng;
            rng.gen_range(0.0..1.0)
        } else {
            1.0 - params.probability
        };
        if u < p {
            self.add_disperser_at(row, col)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `add_disperser_at`: commit one susceptible -> infected (SI) or
    /// susceptible -> exposed (SEI) transition.
    pub fn add_disperser_at(&mut self, row: usize, col: usize) -> Result<()> {
        let idx = self.index(row, col);
        let cell = &mut self.cells[idx];
        cell.susceptible -= 1;
        match self.model_type {
            ModelType::Si => {
                cell.infected += 1;
                *cell.mortality.back_mut().unwrap() += 1;
            }
            ModelType::Sei => {
                *cell.exposed.back_mut().unwrap() += 1;
            }
        }
        self.mark_suitable(row, col);
        Ok(())
    }

    /// `dispersers_from`: how many propagules cell `(row,col)` produces
    /// this step.
    pub fn dispersers_from(
        &self,
        row: usize,
        col: usize,
        rng: &mut dyn RngCore,
        env: &Environment,
        params: GenerationParams,
    ) -> i64 {
        let infected = self.infected_at(row, col);
        if infected == 0 {
            return 0;
        }
        let lambda = params.reproductive_rate * env.weather_at(row, col) * params.competency;
        if params.stochastic {
            if lambda <= 0.0 {
                return 0;
            }
            let poisson = Poisson::new(lambda).expect("lambda > 0");
            (0..infected).map(|_| poisson.sample(rng) as i64).sum()
        } else {
            (lambda * infected as f64).floor() as i64
        }
    }

    /// Draw `n` without replacement from non-negative per-category counts,
    /// each draw biased toward categories with larger remaining mass
    /// (multivariate-hypergeometric walk), returning the per-category draw
    /// counts. Implements the source's `draw_n_from_v` via
    /// `rand::distributions::WeightedIndex` re-weighted after each draw
    /// instead of a manual cumulative-sum scan.
    fn draw_n_from_counts(counts: &[i32], n: i32, rng: &mut dyn RngCore) -> Vec<i32> {
        let mut remaining: Vec<i32> = counts.to_vec();
        let mut drawn = vec![0i32; counts.len()];
        let mut left = n;
        while left > 0 {
            let total: i32 = remaining.iter().sum();
            if total <= 0 {
                break;
            }
            let weights: Vec<u32> = remaining.iter().map(|&c| c.max(0) as u32).collect();
            let dist = match WeightedIndex::new(&weights) {
                Ok(d) => d,
                Err(_) => break,
            };
            let idx = dist.sample(rng);
            remaining[idx] -= 1;
            drawn[idx] += 1;
            left -= 1;
        }
        drawn
    }

    /// `remove_infected_at`: move `n` hosts from infected back to
    /// susceptible, proportionally draining mortality cohorts.
    pub fn remove_infected_at(&mut self, row: usize, col: usize, n: i32, rng: &mut dyn RngCore) -> Result<()> {
        let idx = self.index(row, col);
        if n > self.cells[idx].infected {
            return Err(PopsError::InvariantViolation {
                row: row as i32,
                col: col as i32,
                detail: format!("cannot remove {n} infected hosts, only {} present", self.cells[idx].infected),
            });
        }
        let counts: Vec<i32> = self.cells[idx].mortality.iter().copied().collect();
        let drawn = Self::draw_n_from_counts(&counts, n, rng);
        let cell = &mut self.cells[idx];
        for (slot, d) in cell.mortality.iter_mut().zip(drawn.iter()) {
            *slot -= d;
        }
        cell.infected -= n;
        cell.susceptible += n;
        Ok(())
    }

    /// `remove_exposed_at`: move `n` hosts from exposed cohorts back to
    /// susceptible.
    pub fn remove_exposed_at(&mut self, row: usize, col: usize, n: i32, rng: &mut dyn RngCore) -> Result<()> {
        let idx = self.index(row, col);
        let total_exposed = self.cells[idx].exposed_total();
        if n > total_exposed {
            return Err(PopsError::InvariantViolation {
                row: row as i32,
                col: col as i32,
                detail: format!("cannot remove {n} exposed hosts, only {total_exposed} present"),
            });
        }
        let counts: Vec<i32> = self.cells[idx].exposed.iter().copied().collect();
        let drawn = Self::draw_n_from_counts(&counts, n, rng);
        let cell = &mut self.cells[idx];
        for (slot, d) in cell.exposed.iter_mut().zip(drawn.iter()) {
            *slot -= d;
        }
        cell.susceptible += n;
        Ok(())
    }

    /// `apply_mortality_at`: kill hosts from the oldest qualifying
    /// mortality cohorts.
    pub fn apply_mortality_at(&mut self, row: usize, col: usize, rate: f64, lag: usize) -> Result<()> {
        let idx = self.index(row, col);
        let len = self.cells[idx].mortality.len();
        if lag >= len {
            return Ok(());
        }
        let k_max = len - lag - 1;
        let cell = &mut self.cells[idx];
        for k in 0..=k_max {
            let cohort = cell.mortality[k];
            let killed = if k == 0 { cohort } else { ((rate * cohort as f64).floor() as i32).min(cohort) };
            if killed == 0 {
                continue;
            }
            if killed > cell.infected || killed > cell.total_hosts() {
                return Err(PopsError::InvariantViolation {
                    row: row as i32,
                    col: col as i32,
                    detail: format!("mortality cohort {k} would kill {killed}, exceeding infected/total"),
                });
            }
            cell.mortality[k] -= killed;
            cell.infected -= killed;
            cell.died += killed;
        }
        Ok(())
    }

    /// Rotate every cell's mortality cohort vector left by one.
    pub fn step_forward_mortality(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.mortality.pop_front();
            cell.mortality.push_back(0);
            cell.died = 0;
        }
    }

    /// SEI: age exposed cohorts forward by one step, draining `E_0` into
    /// `I` once `step_index >= latency_period`.
    pub fn step_forward(&mut self, step_index: usize, latency_period: usize) {
        if self.model_type != ModelType::Sei {
            return;
        }
        for cell in self.cells.iter_mut() {
            if step_index >= latency_period {
                let aged_in = cell.exposed[0];
                if aged_in > 0 {
                    cell.infected += aged_in;
                    *cell.mortality.back_mut().unwrap() += aged_in;
                    cell.exposed[0] = 0;
                }
            }
            cell.exposed.pop_front();
            cell.exposed.push_back(0);
        }
    }

    /// Clamp `n` to the susceptible headroom at the destination and move
    /// that many pests (infected) from susceptible at dst... used by
    /// overpopulation movement: the disperser moved is a *pest* arriving,
    /// i.e. equivalent to repeated `add_disperser_at` calls, capped by
    /// how many susceptible hosts remain.
    pub fn pests_to(&mut self, row: usize, col: usize, n: i32) -> Result<i32> {
        let available = self.susceptible_at(row, col);
        let accepted = n.min(available);
        for _ in 0..accepted {
            self.add_disperser_at(row, col)?;
        }
        Ok(accepted)
    }

    /// Remove `n` pests (infected hosts) leaving a cell for overpopulation
    /// movement, clamped to what is present.
    pub fn pest_from(&mut self, row: usize, col: usize, n: i32, rng: &mut dyn RngCore) -> Result<i32> {
        let available = self.infected_at(row, col);
        let removed = n.min(available);
        if removed > 0 {
            self.remove_infected_at(row, col, removed, rng)?;
            let idx = self.index(row, col);
            // remove_infected_at returns the hosts to susceptible, but an
            // overpopulation departure is a true subtraction of hosts from
            // the grid cell (they are in transit), not a S/I swap.
            self.cells[idx].susceptible -= removed;
        }
        Ok(removed)
    }

    /// `move_hosts_from_to`: relocate `n` hosts of any compartment from
    /// `src` to `dst`, categorically sampled without replacement across
    /// {S, I, E (as one pooled category), R}, then, if E was chosen,
    /// sub-sampled across exposed cohorts.
    pub fn move_hosts_from_to(
        &mut self,
        src: (usize, usize),
        dst: (usize, usize),
        n: i32,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let src_idx = self.index(src.0, src.1);
        let counts = [
            self.cells[src_idx].susceptible,
            self.cells[src_idx].infected,
            self.cells[src_idx].exposed_total(),
            self.cells[src_idx].resistant,
        ];
        if n > counts.iter().sum() {
            return Err(PopsError::InvariantViolation {
                row: src.0 as i32,
                col: src.1 as i32,
                detail: format!("cannot move {n} hosts, only {} present", counts.iter().sum::<i32>()),
            });
        }
        let drawn = Self::draw_n_from_counts(&counts, n, rng);
        let dst_idx = self.index(dst.0, dst.1);

        // Susceptible.
        self.cells[src_idx].susceptible -= drawn[0];
        self.cells[dst_idx].susceptible += drawn[0];

        // Infected (drags a proportional mortality draw along with it).
        if drawn[1] > 0 {
            let mortality_counts: Vec<i32> = self.cells[src_idx].mortality.iter().copied().collect();
            let mortality_drawn = Self::draw_n_from_counts(&mortality_counts, drawn[1], rng);
            for (i, d) in mortality_drawn.iter().enumerate() {
                self.cells[src_idx].mortality[i] -= d;
                self.cells[dst_idx].mortality[i] += d;
            }
            self.cells[src_idx].infected -= drawn[1];
            self.cells[dst_idx].infected += drawn[1];
        }

        // Exposed (sub-sampled across cohorts).
        if drawn[2] > 0 {
            let exposed_counts: Vec<i32> = self.cells[src_idx].exposed.iter().copied().collect();
            let exposed_drawn = Self::draw_n_from_counts(&exposed_counts, drawn[2], rng);
            for (i, d) in exposed_drawn.iter().enumerate() {
                self.cells[src_idx].exposed[i] -= d;
                self.cells[dst_idx].exposed[i] += d;
            }
        }

        // Resistant.
        self.cells[src_idx].resistant -= drawn[3];
        self.cells[dst_idx].resistant += drawn[3];

        self.mark_suitable(dst.0, dst.1);
        Ok(())
    }

    /// Permanently remove `n` susceptible hosts (treatment host-kill; not a
    /// relocation, so it is the one mutator that does not conserve
    /// `total_hosts` by redistributing elsewhere). Clamped to what is
    /// present.
    pub fn remove_susceptible_permanently(&mut self, row: usize, col: usize, n: i32) -> i32 {
        let idx = self.index(row, col);
        let removed = n.min(self.cells[idx].susceptible);
        self.cells[idx].susceptible -= removed;
        removed
    }

    /// Move `n` susceptible hosts into resistant (pesticide treatment
    /// start). Assumes the caller already validated `n` against the
    /// current susceptible count.
    pub fn add_resistant(&mut self, row: usize, col: usize, n: i32) {
        let idx = self.index(row, col);
        self.cells[idx].resistant += n;
    }

    /// Move `n` resistant hosts back into susceptible (pesticide treatment
    /// end). Clamped to what is present.
    pub fn move_resistant_to_susceptible(&mut self, row: usize, col: usize, n: i32) -> i32 {
        let idx = self.index(row, col);
        let moved = n.min(self.cells[idx].resistant);
        self.cells[idx].resistant -= moved;
        self.cells[idx].susceptible += moved;
        moved
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simple_pool(model: ModelType, exposed_len: usize) -> HostPool {
        let s = Raster::from_vec(1, 1, 30.0, 30.0, vec![10]);
        let i = Raster::from_vec(1, 1, 30.0, 30.0, vec![5]);
        let total_pop = Raster::from_vec(1, 1, 30.0, 30.0, vec![15]);
        HostPool::new(model, exposed_len, 5, &s, &i, total_pop).unwrap()
    }

    #[test]
    fn add_disperser_si_moves_s_to_i() {
        let mut pool = simple_pool(ModelType::Si, 0);
        pool.add_disperser_at(0, 0).unwrap();
        assert_eq!(pool.susceptible_at(0, 0), 9);
        assert_eq!(pool.infected_at(0, 0), 6);
        assert_eq!(*pool.mortality_by_group_at(0, 0).back().unwrap(), 1);
    }

    #[test]
    fn add_disperser_sei_moves_s_to_e() {
        let mut pool = simple_pool(ModelType::Sei, 3);
        pool.add_disperser_at(0, 0).unwrap();
        assert_eq!(pool.susceptible_at(0, 0), 9);
        assert_eq!(pool.computed_exposed_at(0, 0), 1);
        assert_eq!(pool.infected_at(0, 0), 5);
    }

    #[test]
    fn total_hosts_invariant_after_transitions() {
        let mut pool = simple_pool(ModelType::Sei, 3);
        let before = pool.total_hosts_at(0, 0);
        pool.add_disperser_at(0, 0).unwrap();
        assert_eq!(pool.total_hosts_at(0, 0), before);
    }

    #[test]
    fn remove_infected_rejects_over_removal() {
        let mut pool = simple_pool(ModelType::Si, 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pool.remove_infected_at(0, 0, 6, &mut rng).is_err());
    }

    #[test]
    fn step_forward_mortality_rotates_and_resets_died() {
        let mut pool = simple_pool(ModelType::Si, 0);
        pool.add_disperser_at(0, 0).unwrap();
        let before_len = pool.mortality_by_group_at(0, 0).len();
        pool.step_forward_mortality();
        assert_eq!(pool.mortality_by_group_at(0, 0).len(), before_len);
        assert_eq!(pool.died_at(0, 0), 0);
    }

    #[test]
    fn sei_step_forward_drains_oldest_cohort_after_latency() {
        let mut pool = simple_pool(ModelType::Sei, 2);
        pool.add_disperser_at(0, 0).unwrap(); // lands in E_last (index 1)
        pool.step_forward(0, 2); // rotates; aged_in check only at step_index>=latency
        let infected_before = pool.infected_at(0, 0);
        // After enough rotations the host should age into I.
        pool.step_forward(1, 2);
        pool.step_forward(2, 2);
        assert!(pool.infected_at(0, 0) >= infected_before);
    }
}

//! Scheduled, map-driven interventions: immediate host removal (simple
//! treatment) and time-bounded resistance (pesticide treatment).
//!
//! Grounded in SPEC_FULL.md §4.6 / `include/pops/treatments.hpp`.

use rand::RngCore;

use crate::host_pool::HostPool;
use crate::raster::Raster;

/// How a treatment's `[0,1]` map is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationMode {
    /// `removed = round(fraction * count)` for every compartment.
    Ratio,
    /// Susceptible uses ratio semantics; infected/exposed/mortality are
    /// removed entirely wherever the map is positive.
    AllInfectedInCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentKind {
    Simple,
    Pesticide,
}

/// One scheduled treatment. `map` entries are read as fractions in `[0,1]`
/// (or merely "nonzero" under `AllInfectedInCell` for non-susceptible
/// compartments).
pub struct Treatment {
    pub kind: TreatmentKind,
    pub mode: ApplicationMode,
    pub map: Raster<f64>,
    pub start_step: usize,
    pub end_step: usize,
}

impl Treatment {
    pub fn new(kind: TreatmentKind, mode: ApplicationMode, map: Raster<f64>, start_step: usize, end_step: usize) -> Treatment {
        Treatment { kind, mode, map, start_step, end_step }
    }

    fn removed_count(&self, row: usize, col: usize, count: i32, is_susceptible: bool) -> i32 {
        let fraction = *self.map.get(row, col);
        if fraction <= 0.0 {
            return 0;
        }
        match self.mode {
            ApplicationMode::Ratio => (fraction * count as f64).round() as i32,
            ApplicationMode::AllInfectedInCell => {
                if is_susceptible {
                    (fraction * count as f64).round() as i32
                } else {
                    count
                }
            }
        }
    }

    /// Apply this treatment's effect for `step_index`, if it is the start
    /// (simple: remove; pesticide: move to resistant) or end (pesticide
    /// only: return from resistant to susceptible) step. Returns `true` if
    /// this call returned more hosts to susceptible than the map recorded
    /// as originally treated at any cell (the Q2 overlap case), so the
    /// caller can log it.
    pub fn apply(&self, step_index: usize, host_pool: &mut HostPool, rng: &mut dyn RngCore) -> bool {
        let mut overlap_warning = false;
        if step_index == self.start_step {
            let cells: Vec<(usize, usize)> = host_pool.suitable_cells().to_vec();
            for (row, col) in cells {
                if *self.map.get(row, col) <= 0.0 {
                    continue;
                }
                let s = host_pool.susceptible_at(row, col);
                let removed_s = self.removed_count(row, col, s, true).min(s);

                let i = host_pool.infected_at(row, col);
                let removed_i = self.removed_count(row, col, i, false).min(i);
                let e = host_pool.computed_exposed_at(row, col);
                let removed_e = self.removed_count(row, col, e, false).min(e);

                match self.kind {
                    TreatmentKind::Simple => {
                        if removed_s > 0 {
                            let _ = remove_susceptible(host_pool, row, col, removed_s);
                        }
                        if removed_i > 0 {
                            let _ = host_pool.remove_infected_at(row, col, removed_i, rng);
                            let _ = remove_susceptible(host_pool, row, col, removed_i);
                        }
                        if removed_e > 0 {
                            let _ = host_pool.remove_exposed_at(row, col, removed_e, rng);
                            let _ = remove_susceptible(host_pool, row, col, removed_e);
                        }
                    }
                    TreatmentKind::Pesticide => {
                        if removed_s > 0 {
                            let _ = remove_susceptible(host_pool, row, col, removed_s);
                            add_resistant(host_pool, row, col, removed_s);
                        }
                        if removed_i > 0 {
                            let _ = host_pool.remove_infected_at(row, col, removed_i, rng);
                            let _ = remove_susceptible(host_pool, row, col, removed_i);
                            add_resistant(host_pool, row, col, removed_i);
                        }
                        if removed_e > 0 {
                            let _ = host_pool.remove_exposed_at(row, col, removed_e, rng);
                            let _ = remove_susceptible(host_pool, row, col, removed_e);
                            add_resistant(host_pool, row, col, removed_e);
                        }
                    }
                }
            }
        }

        if self.kind == TreatmentKind::Pesticide && step_index == self.end_step {
            let cells: Vec<(usize, usize)> = host_pool.suitable_cells().to_vec();
            for (row, col) in cells {
                if *self.map.get(row, col) <= 0.0 {
                    continue;
                }
                let r = host_pool.resistant_at(row, col);
                if r > 0 {
                    let originally_treated = self.removed_count(row, col, r, true);
                    if r > originally_treated.max(0) {
                        overlap_warning = true;
                    }
                    remove_resistant_to_susceptible(host_pool, row, col, r);
                }
            }
        }

        overlap_warning
    }
}

// `HostPool` exposes compartment mutation only through its cohort-aware
// methods (there is no raw susceptible/resistant setter by design: every
// mutation must keep I2 obviously true by construction). Treatments need a
// narrower "permanent removal"/"resistance toggle" primitive than the
// cohort-proportional `remove_infected_at`/`remove_exposed_at`, so these
// free functions route through the one escape hatch host_pool exposes for
// that: `move_hosts_from_to` against a synthetic sink would double-count
// total hosts, so treatments instead call the dedicated compartment
// adjustors below, added to `HostPool`'s public surface for this purpose.
fn remove_susceptible(host_pool: &mut HostPool, row: usize, col: usize, n: i32) -> i32 {
    host_pool.remove_susceptible_permanently(row, col, n)
}

fn add_resistant(host_pool: &mut HostPool, row: usize, col: usize, n: i32) {
    host_pool.add_resistant(row, col, n);
}

fn remove_resistant_to_susceptible(host_pool: &mut HostPool, row: usize, col: usize, n: i32) {
    host_pool.move_resistant_to_susceptible(row, col, n);
}

/// Holds every active treatment and applies all qualifying ones per step.
#[derive(Default)]
pub struct Treatments {
    treatments: Vec<Treatment>,
}

impl Treatments {
    pub fn new() -> Treatments {
        Treatments::default()
    }

    pub fn add(&mut self, treatment: Treatment) {
        self.treatments.push(treatment);
    }

    /// Apply every treatment active at `step_index`. Returns `true` if any
    /// treatment reported the Q2 overlap condition this step.
    pub fn apply_step(&self, step_index: usize, host_pool: &mut HostPool, rng: &mut dyn RngCore) -> bool {
        let mut any_overlap = false;
        for treatment in &self.treatments {
            if treatment.apply(step_index, host_pool, rng) {
                any_overlap = true;
            }
        }
        any_overlap
    }

    /// Drop any treatment scheduled to start after `step_index` (supports
    /// computational steering: the caller changed its mind about the
    /// future).
    pub fn clear_after_step(&mut self, step_index: usize) {
        self.treatments.retain(|t| t.start_step <= step_index);
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }
}

//! Movements table: scheduled bulk host relocations (livestock truck, plant
//! shipment, ...) independent of any dispersal kernel.
//!
//! Grounded in SPEC_FULL.md §6's `(row_from, col_from, row_to, col_to,
//! n_hosts)` input plus a parallel step-index schedule, and
//! `include/pops/movements.hpp`'s high-water-mark application order (each
//! movement applies exactly once, the first time its step is reached).

use rand::RngCore;

use crate::error::Result;
use crate::host_pool::HostPool;

#[derive(Debug, Clone, Copy)]
pub struct Movement {
    pub step_index: usize,
    pub row_from: usize,
    pub col_from: usize,
    pub row_to: usize,
    pub col_to: usize,
    pub n_hosts: i32,
}

/// Applies movements in table order, tracking a high-water mark so that
/// calling `apply_through(step_index)` repeatedly (once per step, possibly
/// skipping steps with no movement) never re-applies an already-applied
/// row even if `step_index` does not advance monotonically by exactly one.
pub struct Movements {
    table: Vec<Movement>,
    /// Index into `table` of the first not-yet-applied row.
    last_index: usize,
}

impl Movements {
    pub fn new(mut table: Vec<Movement>) -> Movements {
        table.sort_by_key(|m| m.step_index);
        Movements { table, last_index: 0 }
    }

    /// Apply every movement whose `step_index <= step_index`, in table
    /// order, starting from the high-water mark.
    pub fn apply_through(&mut self, step_index: usize, host_pool: &mut HostPool, rng: &mut dyn RngCore) -> Result<()> {
        while self.last_index < self.table.len() && self.table[self.last_index].step_index <= step_index {
            let m = self.table[self.last_index];
            host_pool.move_hosts_from_to((m.row_from, m.col_from), (m.row_to, m.col_to), m.n_hosts, rng)?;
            self.last_index += 1;
        }
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.last_index >= self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;
    use crate::raster::Raster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool() -> HostPool {
        let s = Raster::from_vec(1, 2, 30.0, 30.0, vec![10, 0]);
        let i = Raster::from_vec(1, 2, 30.0, 30.0, vec![0, 0]);
        let total = Raster::from_vec(1, 2, 30.0, 30.0, vec![10, 0]);
        HostPool::new(ModelType::Si, 0, 5, &s, &i, total).unwrap()
    }

    #[test]
    fn applies_once_and_advances_high_water_mark() {
        let mut host_pool = pool();
        let mut movements = Movements::new(vec![Movement {
            step_index: 2,
            row_from: 0,
            col_from: 0,
            row_to: 0,
            col_to: 1,
            n_hosts: 3,
        }]);
        let mut rng = StdRng::seed_from_u64(1);
        movements.apply_through(1, &mut host_pool, &mut rng).unwrap();
        assert_eq!(host_pool.susceptible_at(0, 1), 0);
        movements.apply_through(2, &mut host_pool, &mut rng).unwrap();
        assert_eq!(host_pool.susceptible_at(0, 1), 3);
        assert!(movements.is_exhausted());
        movements.apply_through(5, &mut host_pool, &mut rng).unwrap();
        assert_eq!(host_pool.susceptible_at(0, 1), 3);
    }
}

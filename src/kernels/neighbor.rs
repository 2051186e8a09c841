//! Deterministic neighbor kernel: fixed compass direction, always offsets
//! the source cell by the same `(dRow, dCol) in {-1,0,1}^2`.

use rand::RngCore;

use crate::config::Direction;
use crate::kernels::{Kernel, Target};

pub struct DeterministicNeighborKernel {
    direction: Direction,
}

impl DeterministicNeighborKernel {
    pub fn new(direction: Direction) -> Self {
        DeterministicNeighborKernel { direction }
    }
}

impl Kernel for DeterministicNeighborKernel {
    fn disperse(&mut self, _rng: &mut dyn RngCore, row: i32, col: i32) -> Target {
        let (dr, dc) = self.direction.neighbor_offset();
        (row + dr, col + dc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn east_always_increments_col() {
        let mut k = DeterministicNeighborKernel::new(Direction::E);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(k.disperse(&mut rng, 3, 3), (3, 4));
        assert_eq!(k.disperse(&mut rng, 0, 0), (0, 1));
    }
}

//! Natural/anthropogenic selector: composes two kernels behind a Bernoulli
//! gate.
//!
//! Grounded in §4.4's selector paragraph and DESIGN NOTES' "kernel
//! polymorphism without inheritance chains" — a thin dispatching wrapper
//! over two `Box<dyn Kernel>`s rather than the source's templated
//! `SwitchKernel`.

use rand::{Rng, RngCore};

use crate::kernels::{Kernel, Target};

pub struct NaturalAnthropogenicKernel {
    natural: Box<dyn Kernel>,
    anthropogenic: Option<Box<dyn Kernel>>,
    p_natural: f64,
}

impl NaturalAnthropogenicKernel {
    pub fn new(natural: Box<dyn Kernel>, anthropogenic: Option<Box<dyn Kernel>>, p_natural: f64) -> Self {
        NaturalAnthropogenicKernel { natural, anthropogenic, p_natural }
    }
}

impl Kernel for NaturalAnthropogenicKernel {
    fn disperse(&mut self, rng: &mut dyn RngCore, row: i32, col: i32) -> Target {
        let use_anthropogenic = match &self.anthropogenic {
            Some(k) if k.is_cell_eligible(row, col) => !rng.gen_bool(self.p_natural),
            _ => false,
        };
        if use_anthropogenic {
            self.anthropogenic.as_mut().unwrap().disperse(rng, row, col)
        } else {
            self.natural.disperse(rng, row, col)
        }
    }

    fn is_cell_eligible(&self, row: i32, col: i32) -> bool {
        self.natural.is_cell_eligible(row, col)
            || self.anthropogenic.as_ref().map(|k| k.is_cell_eligible(row, col)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::neighbor::DeterministicNeighborKernel;
    use crate::config::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn routes_to_natural_when_anthropogenic_absent() {
        let natural = Box::new(DeterministicNeighborKernel::new(Direction::E));
        let mut selector = NaturalAnthropogenicKernel::new(natural, None, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.disperse(&mut rng, 2, 2), (2, 3));
    }

    #[test]
    fn routes_to_anthropogenic_when_p_natural_is_zero() {
        let natural = Box::new(DeterministicNeighborKernel::new(Direction::E));
        let anthro = Box::new(DeterministicNeighborKernel::new(Direction::S));
        let mut selector = NaturalAnthropogenicKernel::new(natural, Some(anthro), 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.disperse(&mut rng, 2, 2), (3, 2));
    }
}

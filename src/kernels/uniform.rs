//! Uniform kernel: row and column sampled independently and uniformly
//! across the whole grid.

use rand::{Rng, RngCore};

use crate::kernels::{Kernel, Target};

pub struct UniformKernel {
    rows: usize,
    cols: usize,
}

impl UniformKernel {
    pub fn new(rows: usize, cols: usize) -> Self {
        UniformKernel { rows, cols }
    }
}

impl Kernel for UniformKernel {
    fn disperse(&mut self, rng: &mut dyn RngCore, _row: i32, _col: i32) -> Target {
        let r = rng.gen_range(0..self.rows as i32);
        let c = rng.gen_range(0..self.cols as i32);
        (r, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn always_lands_inside_grid() {
        let mut k = UniformKernel::new(5, 7);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let (r, c) = k.disperse(&mut rng, 0, 0);
            assert!((0..5).contains(&r));
            assert!((0..7).contains(&c));
        }
    }
}

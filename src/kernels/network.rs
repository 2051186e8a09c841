//! Network kernel: random walk over a graph of segments, accumulating a
//! per-cell travel cost until a sampled budget is exhausted.
//!
//! Grounded in the data model's "Network graph" + §4.4's network-kernel
//! paragraph. Not eligible at cells with no node (the only kernel for which
//! `is_cell_eligible` is not unconditionally true).

use std::rc::Rc;

use rand::{Rng, RngCore};

use crate::kernels::{Kernel, Target};
use crate::network_graph::Network;

pub struct NetworkKernel {
    network: Rc<Network>,
    min_time: f64,
    max_time: f64,
}

impl NetworkKernel {
    pub fn new(network: Rc<Network>, min_time: f64, max_time: f64) -> Self {
        NetworkKernel { network, min_time, max_time }
    }
}

impl Kernel for NetworkKernel {
    fn disperse(&mut self, rng: &mut dyn RngCore, row: i32, col: i32) -> Target {
        let mut budget: f64 = rng.gen_range(self.min_time..=self.max_time.max(self.min_time));
        let mut node = match self.network.node_at(row, col) {
            Some(n) => n,
            None => return (row, col),
        };
        let mut last_cell = (row, col);

        loop {
            let neighbors = self.network.neighbors(node);
            if neighbors.is_empty() {
                return last_cell;
            }
            let idx = rng.gen_range(0..neighbors.len());
            let segment = &neighbors[idx];
            for &cell in &segment.polyline {
                last_cell = cell;
                budget -= 1.0;
                if budget <= 0.0 {
                    return last_cell;
                }
            }
            node = segment.to;
        }
    }

    fn is_cell_eligible(&self, row: i32, col: i32) -> bool {
        self.network.node_at(row, col).is_some()
    }
}

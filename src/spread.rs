//! Spread action: per-step generation and dispersal of propagules, plus the
//! optional overpopulation-driven emigration pass.
//!
//! Grounded in SPEC_FULL.md §4.5 / original source's `include/pops/spread.hpp`
//! generate-then-disperse loop.

use rand::RngCore;

use crate::environment::Environment;
use crate::host_pool::{EstablishmentParams, GenerationParams, HostPool};
use crate::kernels::Kernel;
use crate::raster::Raster;
use crate::soil::SoilPool;

/// Step 1/2/3 of §4.5 for every suitable cell.
///
/// **Soil resolution note.** The distilled spec's step 2 says "for
/// `k=1..n`" where `n` is the same count written to `dispersers(i,j)` in
/// step 1, which would disperse the buried fraction too. Read literally
/// that defeats the purpose of a soil reservoir (the whole point is that a
/// fraction of generated dispersers skip the kernel this step), so this
/// port disperses only the non-buried remainder through the kernel and
/// buries the rest — the reading `include/pops/soils.hpp`'s split actually
/// implements. Recorded as a DESIGN.md decision.
pub fn run_spread_step(
    host_pool: &mut HostPool,
    dispersers: &mut Raster<i32>,
    established_dispersers: &mut Raster<i32>,
    outside_dispersers: &mut Vec<(i32, i32)>,
    kernel: &mut dyn Kernel,
    soil: Option<&mut SoilPool>,
    soil_fraction: f64,
    env: &Environment,
    generation: GenerationParams,
    establishment: EstablishmentParams,
    rng: &mut dyn RngCore,
) {
    let cells: Vec<(usize, usize)> = host_pool.suitable_cells().to_vec();
    let mut soil = soil;

    for (row, col) in cells {
        let n = host_pool.dispersers_from(row, col, rng, env, generation);
        let n = n.clamp(0, i32::MAX as i64) as i32;

        let buried = if let Some(soil) = soil.as_deref_mut() {
            let buried = ((soil_fraction * n as f64).round() as i32).clamp(0, n);
            soil.deposit(row, col, buried);
            buried
        } else {
            0
        };

        dispersers.set(row, col, n);
        established_dispersers.set(row, col, n);

        let to_disperse = n - buried;
        for _ in 0..to_disperse {
            let (r, c) = kernel.disperse(rng, row as i32, col as i32);
            if !dispersers.in_bounds(r, c) {
                outside_dispersers.push((r, c));
                *established_dispersers.get_mut(row, col) -= 1;
                continue;
            }
            let established = host_pool
                .disperser_to(r as usize, c as usize, rng, env, establishment)
                .unwrap_or(false);
            if !established {
                *established_dispersers.get_mut(row, col) -= 1;
            }
        }

        if let Some(soil) = soil.as_deref_mut() {
            let drawn = soil.draw_out(row, col, rng);
            for _ in 0..drawn {
                let _ = host_pool.disperser_to(row, col, rng, env, establishment);
            }
        }
    }
}

/// Overpopulation emigration: cells at or above `overpopulation_percentage`
/// emit `floor(leaving_percentage * I)` pests through `overpop_kernel`
/// (same family as natural, scaled by `leaving_scale_coefficient` at
/// construction). Gathered first, committed second, so a cell that just
/// received pests this step cannot itself emigrate them within the same
/// pass.
pub fn run_overpopulation_step(
    host_pool: &mut HostPool,
    overpop_kernel: &mut dyn Kernel,
    overpopulation_percentage: f64,
    leaving_percentage: f64,
    rng: &mut dyn RngCore,
) {
    let cells: Vec<(usize, usize)> = host_pool.suitable_cells().to_vec();

    let mut moves: Vec<((usize, usize), (i32, i32), i32)> = Vec::new();
    for (row, col) in &cells {
        let (row, col) = (*row, *col);
        let total = host_pool.total_hosts_at(row, col);
        if total == 0 {
            continue;
        }
        let infected = host_pool.infected_at(row, col);
        let ratio = infected as f64 / total as f64;
        if ratio < overpopulation_percentage {
            continue;
        }
        let leaving = (leaving_percentage * infected as f64).floor() as i32;
        if leaving <= 0 {
            continue;
        }
        let target = overpop_kernel.disperse(rng, row as i32, col as i32);
        moves.push(((row, col), target, leaving));
    }

    for ((src_row, src_col), (dst_row, dst_col), n) in moves {
        let removed = host_pool.pest_from(src_row, src_col, n, rng).unwrap_or(0);
        if removed == 0 || dst_row < 0 || dst_col < 0 {
            continue;
        }
        if (dst_row as usize) < host_pool.rows() && (dst_col as usize) < host_pool.cols() {
            let _ = host_pool.pests_to(dst_row as usize, dst_col as usize, removed);
        }
    }
}

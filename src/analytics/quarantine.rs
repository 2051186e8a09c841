//! Quarantine-escape distance/direction per area id.

use std::collections::HashMap;

use crate::raster::{CellBBox, Raster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    North,
    South,
    East,
    West,
}

const DIRECTIONS: [Compass; 4] = [Compass::North, Compass::South, Compass::East, Compass::West];

/// One step's escape reading: `escape=true` means an infected cell had no
/// assigned quarantine area (id 0) this step, in which case distance and
/// direction are meaningless (`None`/`NaN`); otherwise the minimum
/// perpendicular distance (in map units) from any infected cell to its
/// area's bbox edge, in the nearest of the four compass directions.
#[derive(Debug, Clone, Copy)]
pub struct QuarantineStep {
    pub escaped: bool,
    pub distance: f64,
    pub direction: Option<Compass>,
}

pub struct QuarantineEscape {
    /// area id -> bbox, built once from the input raster.
    area_bboxes: HashMap<i32, CellBBox>,
    ns_res: f64,
    ew_res: f64,
    steps: Vec<QuarantineStep>,
}

impl QuarantineEscape {
    /// Build the per-area bboxes from a raster of positive area ids (0
    /// means "no quarantine area").
    pub fn new(areas: &Raster<i32>, ns_res: f64, ew_res: f64) -> QuarantineEscape {
        let mut by_area: HashMap<i32, Vec<(usize, usize)>> = HashMap::new();
        for (r, c, &id) in areas.iter_cells() {
            if id > 0 {
                by_area.entry(id).or_default().push((r, c));
            }
        }
        let area_bboxes = by_area
            .into_iter()
            .map(|(id, cells)| (id, CellBBox::from_cells(cells)))
            .collect();
        QuarantineEscape { area_bboxes, ns_res, ew_res, steps: Vec::new() }
    }

    /// Record this step's escape status given the current area-id raster
    /// and the set of currently infected cells.
    pub fn record_step<I: IntoIterator<Item = (usize, usize)>>(&mut self, areas: &Raster<i32>, infected_cells: I) {
        let mut escaped = false;
        let mut best: Option<(f64, Compass)> = None;

        for (row, col) in infected_cells {
            let id = *areas.get(row, col);
            if id <= 0 {
                escaped = true;
                continue;
            }
            let bbox = match self.area_bboxes.get(&id) {
                Some(b) => b,
                None => {
                    escaped = true;
                    continue;
                }
            };
            if escaped {
                continue;
            }
            for &dir in &DIRECTIONS {
                let dist = perpendicular_distance(bbox, row, col, dir, self.ns_res, self.ew_res);
                if best.map(|(d, _)| dist < d).unwrap_or(true) {
                    best = Some((dist, dir));
                }
            }
        }

        let step = if escaped {
            QuarantineStep { escaped: true, distance: f64::NAN, direction: None }
        } else {
            match best {
                Some((d, dir)) => QuarantineStep { escaped: false, distance: d, direction: Some(dir) },
                None => QuarantineStep { escaped: false, distance: f64::NAN, direction: None },
            }
        };
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[QuarantineStep] {
        &self.steps
    }

    /// Fraction of recorded steps with `escaped=true`.
    pub fn escape_probability(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let escaped = self.steps.iter().filter(|s| s.escaped).count();
        escaped as f64 / self.steps.len() as f64
    }
}

fn perpendicular_distance(bbox: &CellBBox, row: usize, col: usize, dir: Compass, ns_res: f64, ew_res: f64) -> f64 {
    let (row, col) = (row as i32, col as i32);
    match dir {
        Compass::North => ((row - bbox.north).max(0)) as f64 * ns_res,
        Compass::South => ((bbox.south - row).max(0)) as f64 * ns_res,
        Compass::East => ((bbox.east - col).max(0)) as f64 * ew_res,
        Compass::West => ((col - bbox.west).max(0)) as f64 * ew_res,
    }
}

//! Per-step spread rate in map units per step, one four-tuple (north,
//! south, east, west) per step.

use crate::raster::CellBBox;

/// `NaN` marks "no rate this step" (no infected cells) or "escaped the
/// grid edge" (see [`SpreadRate::record_step`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalRate {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl DirectionalRate {
    pub const NAN: DirectionalRate = DirectionalRate { north: f64::NAN, south: f64::NAN, east: f64::NAN, west: f64::NAN };
}

pub struct SpreadRate {
    rows: usize,
    cols: usize,
    ns_res: f64,
    ew_res: f64,
    bboxes: Vec<CellBBox>,
    rates: Vec<DirectionalRate>,
}

impl SpreadRate {
    pub fn new(rows: usize, cols: usize, ns_res: f64, ew_res: f64) -> SpreadRate {
        SpreadRate { rows, cols, ns_res, ew_res, bboxes: Vec::new(), rates: Vec::new() }
    }

    /// Compute and record this step's bbox and rate relative to the
    /// previous step. The very first recorded step has no predecessor, so
    /// its rate is `NaN` in every direction.
    pub fn record_step<I: IntoIterator<Item = (usize, usize)>>(&mut self, infected_cells: I) {
        let bbox = CellBBox::from_cells(infected_cells);
        let rate = match self.bboxes.last() {
            None => DirectionalRate::NAN,
            Some(prev) => {
                if !bbox.is_valid() || !prev.is_valid() {
                    DirectionalRate::NAN
                } else {
                    let mut north_rate = (prev.north - bbox.north) as f64 * self.ns_res;
                    let mut south_rate = (bbox.south - prev.south) as f64 * self.ns_res;
                    let mut east_rate = (bbox.east - prev.east) as f64 * self.ew_res;
                    let mut west_rate = (prev.west - bbox.west) as f64 * self.ew_res;

                    if north_rate == 0.0 && bbox.north == 0 {
                        north_rate = f64::NAN;
                    }
                    if south_rate == 0.0 && bbox.south as usize == self.rows - 1 {
                        south_rate = f64::NAN;
                    }
                    if east_rate == 0.0 && bbox.east as usize == self.cols - 1 {
                        east_rate = f64::NAN;
                    }
                    if west_rate == 0.0 && bbox.west == 0 {
                        west_rate = f64::NAN;
                    }
                    DirectionalRate { north: north_rate, south: south_rate, east: east_rate, west: west_rate }
                }
            }
        };
        self.bboxes.push(bbox);
        self.rates.push(rate);
    }

    pub fn rates(&self) -> &[DirectionalRate] {
        &self.rates
    }

    pub fn bboxes(&self) -> &[CellBBox] {
        &self.bboxes
    }
}

/// Average spread rate across replicate runs, skipping `NaN` per direction
/// independently (one run escaping north does not poison the east rate of
/// another run at the same step).
pub fn average_spread_rate(runs: &[Vec<DirectionalRate>]) -> Vec<DirectionalRate> {
    if runs.is_empty() {
        return Vec::new();
    }
    let steps = runs.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(steps);
    for step in 0..steps {
        let mut sums = [0.0f64; 4];
        let mut counts = [0usize; 4];
        for run in runs {
            if let Some(rate) = run.get(step) {
                let values = [rate.north, rate.south, rate.east, rate.west];
                for (k, v) in values.iter().enumerate() {
                    if !v.is_nan() {
                        sums[k] += v;
                        counts[k] += 1;
                    }
                }
            }
        }
        let avg = |s: f64, c: usize| if c == 0 { f64::NAN } else { s / c as f64 };
        out.push(DirectionalRate {
            north: avg(sums[0], counts[0]),
            south: avg(sums[1], counts[1]),
            east: avg(sums[2], counts[2]),
            west: avg(sums[3], counts[3]),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_has_no_rate() {
        let mut sr = SpreadRate::new(10, 10, 30.0, 30.0);
        sr.record_step([(5, 5)]);
        assert!(sr.rates()[0].north.is_nan());
    }

    #[test]
    fn rate_is_zero_when_bbox_unchanged() {
        let mut sr = SpreadRate::new(10, 10, 30.0, 30.0);
        sr.record_step([(5, 5)]);
        sr.record_step([(5, 5)]);
        let rate = sr.rates()[1];
        assert_eq!(rate.north, 0.0);
        assert_eq!(rate.south, 0.0);
    }

    #[test]
    fn edge_touch_with_zero_rate_is_nan() {
        let mut sr = SpreadRate::new(10, 10, 30.0, 30.0);
        sr.record_step([(0, 5)]);
        sr.record_step([(0, 5)]);
        assert!(sr.rates()[1].north.is_nan());
    }

    #[test]
    fn average_skips_nan_per_direction() {
        let a = vec![DirectionalRate { north: 1.0, south: f64::NAN, east: 2.0, west: 0.0 }];
        let b = vec![DirectionalRate { north: 3.0, south: 4.0, east: f64::NAN, west: 0.0 }];
        let avg = average_spread_rate(&[a, b]);
        assert_eq!(avg[0].north, 2.0);
        assert_eq!(avg[0].south, 4.0);
        assert_eq!(avg[0].east, 2.0);
    }
}

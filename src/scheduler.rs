//! Calendar/scheduler: maps `(start, end, unit, multiplier)` onto an ordered
//! sequence of step intervals, and derives per-action boolean schedule
//! masks.
//!
//! Grounded in `scheduling.hpp`: `Step`, `StepUnit`, `Scheduler` and its
//! `schedule_*` methods are carried over with identical semantics. Unlike
//! the source, where a `Scheduler` value can exist before
//! `create_schedules()` is called elsewhere, this type's constructor *is*
//! the build step — by the time a `Scheduler` exists its `steps` vector is
//! already populated, so I7 ("schedule masks readable only after build")
//! is enforced by the type system rather than by a runtime flag.

use crate::date::Date;
use crate::error::{PopsError, Result};

/// Unit used to advance the cursor between simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepUnit {
    Day,
    Week,
    Month,
}

/// A closed date range `[start_date, end_date]` representing one simulation
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    start_date: Date,
    end_date: Date,
}

impl Step {
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    pub fn end_date(&self) -> Date {
        self.end_date
    }

    pub fn contains(&self, date: Date) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Inclusive month range defining the spread season (1-12, `start <= end`
/// within a calendar year).
#[derive(Debug, Clone, Copy)]
pub struct Season {
    pub start_month: u32,
    pub end_month: u32,
}

impl Season {
    pub fn month_in_season(&self, month: u32) -> bool {
        month >= self.start_month && month <= self.end_month
    }
}

/// Produces the step sequence for a run and all derived schedule masks.
pub struct Scheduler {
    steps: Vec<Step>,
}

impl Scheduler {
    /// Build the step sequence. Fails if `start >= end`, if a single step
    /// would exceed the interval, or if `unit == Month` and `start.day() !=
    /// 1`.
    pub fn new(start: Date, end: Date, unit: StepUnit, multiplier: u32) -> Result<Scheduler> {
        if start >= end {
            return Err(PopsError::Configuration(
                "scheduler start date must be before end date".into(),
            ));
        }
        if unit == StepUnit::Month && start.day() != 1 {
            return Err(PopsError::Configuration(
                "if step unit is month, start date must start the first day of a month".into(),
            ));
        }
        let advance = |d: Date| -> Date {
            match unit {
                StepUnit::Day => d.add_days(multiplier),
                StepUnit::Week => d.add_weeks(multiplier),
                StepUnit::Month => d.add_months(multiplier),
            }
        };
        let mut probe = start;
        probe = advance(probe);
        if probe > end {
            return Err(PopsError::Configuration(
                "there must be at least one step between start and end date".into(),
            ));
        }

        let mut steps = Vec::new();
        let mut cursor = start;
        while cursor < end {
            let step_start = cursor;
            cursor = advance(cursor);
            let step_end = cursor.subtract_day();
            steps.push(Step { start_date: step_start, end_date: step_end });
        }
        Ok(Scheduler { steps })
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn schedule_spread(&self, season: &Season) -> Vec<bool> {
        self.steps
            .iter()
            .map(|s| {
                season.month_in_season(s.start_date().month()) || season.month_in_season(s.end_date().month())
            })
            .collect()
    }

    /// True for the step whose interval contains `(year-of-step, month,
    /// day)`. Does not handle a year boundary falling inside a single step
    /// interval, matching the source's documented limitation.
    pub fn schedule_action_yearly(&self, month: u32, day: u32) -> Vec<bool> {
        self.steps
            .iter()
            .map(|s| {
                let probe = Date::new(s.start_date().year(), month, day);
                probe >= s.start_date() && probe <= s.end_date()
            })
            .collect()
    }

    pub fn schedule_action_end_of_year(&self) -> Vec<bool> {
        self.steps.iter().map(|s| s.end_date().is_last_day_of_year()).collect()
    }

    /// True at 1-indexed positions where `position % n == 0`.
    pub fn schedule_action_nsteps(&self, n_steps: u32) -> Vec<bool> {
        (0..self.steps.len() as u32).map(|i| (i + 1) % n_steps == 0).collect()
    }

    pub fn schedule_action_monthly(&self) -> Vec<bool> {
        self.steps
            .iter()
            .map(|s| s.start_date().month() != s.end_date().month() || s.end_date().is_last_day_of_month())
            .collect()
    }

    /// The unique step index whose interval contains `date`.
    pub fn schedule_action_date(&self, date: Date) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.contains(date))
            .ok_or_else(|| PopsError::Configuration("date is outside of schedule".into()))
    }

    /// Weather-table index per step: `ceil((i+1) / (num_steps/size)) - 1`,
    /// clamped to `size - 1`.
    pub fn weather_table(&self, size: usize) -> Vec<usize> {
        let num_steps = self.steps.len();
        if size == 0 || num_steps == 0 {
            return Vec::new();
        }
        let ratio = num_steps as f64 / size as f64;
        (0..num_steps)
            .map(|i| {
                let idx = (((i + 1) as f64) / ratio).ceil() as usize;
                idx.saturating_sub(1).min(size - 1)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_start_after_end() {
        let start = Date::new(2020, 1, 1);
        let end = Date::new(2019, 1, 1);
        assert!(Scheduler::new(start, end, StepUnit::Day, 1).is_err());
    }

    #[test]
    fn month_unit_requires_first_of_month() {
        let start = Date::new(2020, 1, 15);
        let end = Date::new(2020, 6, 1);
        assert!(Scheduler::new(start, end, StepUnit::Month, 1).is_err());
    }

    #[test]
    fn monthly_steps_across_a_year() {
        let start = Date::new(2020, 1, 1);
        let end = Date::new(2021, 1, 1);
        let sched = Scheduler::new(start, end, StepUnit::Month, 1).unwrap();
        assert_eq!(sched.num_steps(), 12);
        assert_eq!(sched.steps()[0].end_date(), Date::new(2020, 1, 31));
        assert_eq!(sched.steps()[11].end_date(), Date::new(2020, 12, 31));
    }

    #[test]
    fn end_of_year_mask() {
        let start = Date::new(2020, 1, 1);
        let end = Date::new(2021, 1, 1);
        let sched = Scheduler::new(start, end, StepUnit::Month, 1).unwrap();
        let mask = sched.schedule_action_end_of_year();
        assert_eq!(mask.len(), 12);
        assert!(mask[11]);
        assert!(!mask[0]);
    }

    #[test]
    fn schedule_action_date_roundtrip() {
        let start = Date::new(2020, 1, 1);
        let end = Date::new(2020, 4, 1);
        let sched = Scheduler::new(start, end, StepUnit::Day, 10).unwrap();
        let probe = Date::new(2020, 2, 5);
        let idx = sched.schedule_action_date(probe).unwrap();
        assert!(sched.steps()[idx].contains(probe));
    }

    #[test]
    fn every_n_steps_mask() {
        let start = Date::new(2020, 1, 1);
        let end = Date::new(2020, 1, 1).add_days(100);
        let sched = Scheduler::new(start, end, StepUnit::Day, 10).unwrap();
        let mask = sched.schedule_action_nsteps(2);
        assert_eq!(mask, vec![false, true, false, true, false, true, false, true, false, true]);
    }
}

//! Lightweight profiling utility for measuring per-step performance.
//!
//! Enable with the `profile` feature; `Model` does not use this itself
//! (the `log::trace!` calls in `model.rs` cover ordinary diagnostics), but
//! callers driving many steps in a benchmark or a long batch run can wrap
//! `Model::run_step` calls in a [`StepProfiler`] to get a per-sub-action
//! breakdown.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects timing data for named sections and reports aggregated
/// statistics.
#[derive(Default)]
pub struct Profiler {
    sections: HashMap<String, SectionStats>,
    current_section: Option<(String, Instant)>,
    step_count: u64,
}

/// Statistics for a profiled section.
#[derive(Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a named section. Call `end_section` to stop timing.
    pub fn begin_section(&mut self, name: &str) {
        self.current_section = Some((name.to_string(), Instant::now()));
    }

    /// End the current section and record its duration.
    pub fn end_section(&mut self) {
        if let Some((name, start)) = self.current_section.take() {
            let elapsed = start.elapsed();
            let stats = self.sections.entry(name).or_default();
            stats.total_time += elapsed;
            stats.call_count += 1;
            stats.min_time = Some(stats.min_time.map_or(elapsed, |m| m.min(elapsed)));
            stats.max_time = Some(stats.max_time.map_or(elapsed, |m| m.max(elapsed)));
        }
    }

    /// Time a section using a closure.
    pub fn time_section<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.begin_section(name);
        let result = f();
        self.end_section();
        result
    }

    /// Increment the step counter.
    pub fn tick(&mut self) {
        self.step_count += 1;
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(|s| s.as_str()).collect()
    }

    /// Print a summary of all profiled sections.
    pub fn print_summary(&self) {
        println!("\n=== Profiler Summary ({} steps) ===", self.step_count);

        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));

        let total: Duration = sections.iter().map(|(_, s)| s.total_time).sum();

        println!(
            "{:<25} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Section", "Total", "Avg/step", "Min", "Max", "% Time"
        );
        println!("{}", "-".repeat(78));

        for (name, stats) in &sections {
            let avg_per_step = if self.step_count > 0 {
                stats.total_time / self.step_count as u32
            } else {
                Duration::ZERO
            };

            let pct = if total.as_nanos() > 0 {
                (stats.total_time.as_nanos() as f64 / total.as_nanos() as f64) * 100.0
            } else {
                0.0
            };

            println!(
                "{:<25} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                avg_per_step,
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }

        println!("{}", "-".repeat(78));
        println!("{:<25} {:>10.2?}", "TOTAL", total);

        if self.step_count > 0 {
            let avg_step = total / self.step_count as u32;
            let steps_per_sec = if avg_step.as_secs_f64() > 0.0 { 1.0 / avg_step.as_secs_f64() } else { 0.0 };
            println!("{:<25} {:>10.2?} ({:.1} steps/s)", "Avg per step", avg_step, steps_per_sec);
        }
        println!();
    }

    pub fn reset(&mut self) {
        self.sections.clear();
        self.current_section = None;
        self.step_count = 0;
    }
}

/// Wraps a run of `Model::run_step` calls and reports per-sub-action
/// timing breakdowns alongside overall throughput.
pub struct StepProfiler {
    pub profiler: Profiler,
    pub total_time: Duration,
}

impl StepProfiler {
    pub fn new() -> Self {
        Self { profiler: Profiler::new(), total_time: Duration::ZERO }
    }

    /// Record one step's total time.
    pub fn record_step(&mut self, duration: Duration) {
        self.total_time += duration;
        self.profiler.tick();
    }

    /// Print final summary.
    pub fn print_summary(&self, suitable_cell_count: usize) {
        let steps = self.profiler.step_count();
        let avg_step = if steps > 0 { self.total_time / steps as u32 } else { Duration::ZERO };

        println!("\n=== Simulation Run Summary ===");
        println!("Suitable cells: {suitable_cell_count}");
        println!("Steps: {steps}");
        println!("Total time: {:?}", self.total_time);
        println!("Avg per step: {:?} ({:.2} ms)", avg_step, avg_step.as_secs_f64() * 1000.0);

        let steps_per_sec = if avg_step.as_secs_f64() > 0.0 { 1.0 / avg_step.as_secs_f64() } else { 0.0 };
        println!("Effective steps/s: {steps_per_sec:.1}");

        if !self.profiler.sections.is_empty() {
            self.profiler.print_summary();
        }
    }
}

impl Default for StepProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_profiler_basic() {
        let mut profiler = Profiler::new();

        profiler.time_section("test_section", || {
            sleep(Duration::from_millis(10));
        });

        profiler.tick();

        let stats = profiler.get_section("test_section").unwrap();
        assert!(stats.total_time >= Duration::from_millis(10));
        assert_eq!(stats.call_count, 1);
    }

    #[test]
    fn test_profiler_multiple_sections() {
        let mut profiler = Profiler::new();

        for _ in 0..5 {
            profiler.time_section("fast", || {
                sleep(Duration::from_millis(1));
            });
            profiler.time_section("slow", || {
                sleep(Duration::from_millis(5));
            });
            profiler.tick();
        }

        assert_eq!(profiler.step_count(), 5);

        let fast = profiler.get_section("fast").unwrap();
        let slow = profiler.get_section("slow").unwrap();

        assert_eq!(fast.call_count, 5);
        assert_eq!(slow.call_count, 5);
        assert!(slow.total_time > fast.total_time);
    }
}

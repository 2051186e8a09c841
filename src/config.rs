//! The `Config` value object: every tunable the engine reads, plus
//! validation.
//!
//! `Config` itself is a plain `serde`-round-trippable struct (teacher
//! convention: see `world.rs`'s `Snapshot` / `systems/serialization.rs`) so
//! callers can load it from JSON however they like; `Config::validate()` is
//! the actual "Configuration error" gate described in SPEC_FULL.md §7 and
//! runs once, at `Model::new()`, not during deserialization.

use serde::{Deserialize, Serialize};

use crate::error::{PopsError, Result};
use crate::kernels::DispersalKernelType;
use crate::raster::BBox;
use crate::scheduler::StepUnit;

/// Host compartment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Susceptible/Infected.
    Si,
    /// Susceptible/Exposed/Infected.
    Sei,
}

/// Compass direction used by wind-biased radial kernels and the
/// deterministic-neighbor kernel. `None` disables directionality (von Mises
/// degenerates to uniform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
    None,
}

impl Direction {
    /// Wind direction in radians, measured clockwise from north, used as the
    /// von Mises mean angle. `None` is meaningless here (kappa is forced to
    /// 0 by the caller).
    pub fn radians(&self) -> f64 {
        use std::f64::consts::PI;
        match self {
            Direction::N => 0.0,
            Direction::Ne => PI / 4.0,
            Direction::E => PI / 2.0,
            Direction::Se => 3.0 * PI / 4.0,
            Direction::S => PI,
            Direction::Sw => 5.0 * PI / 4.0,
            Direction::W => 3.0 * PI / 2.0,
            Direction::Nw => 7.0 * PI / 4.0,
            Direction::None => 0.0,
        }
    }

    /// `(d_row, d_col)` offset used by the deterministic-neighbor kernel.
    /// Row increases southward, col increases eastward.
    pub fn neighbor_offset(&self) -> (i32, i32) {
        match self {
            Direction::N => (-1, 0),
            Direction::Ne => (-1, 1),
            Direction::E => (0, 1),
            Direction::Se => (1, 1),
            Direction::S => (1, 0),
            Direction::Sw => (1, -1),
            Direction::W => (0, -1),
            Direction::Nw => (-1, -1),
            Direction::None => (0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherType {
    Probabilistic,
    Deterministic,
}

/// Which sub-kernel family a given disperser batch uses: either the engine
/// asks the natural/anthropogenic selector for natural movement, or for the
/// optional higher-speed human-mediated movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkMovement {
    /// Walk may both enter and leave the network at any node.
    Walk,
    /// Walk may only jump between network nodes (teleport along edges).
    Jump,
}

/// Every tunable the engine reads. Field groups mirror SPEC_FULL.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub random_seed: u64,
    pub multiple_random_seeds: bool,
    pub random_seeds: std::collections::HashMap<String, u64>,

    pub rows: usize,
    pub cols: usize,
    pub ew_res: f64,
    pub ns_res: f64,
    pub bbox: BBox,

    pub generate_stochasticity: bool,
    pub establishment_stochasticity: bool,
    pub movement_stochasticity: bool,
    pub dispersal_stochasticity: bool,
    pub establishment_probability: f64,

    pub use_lethal_temperature: bool,
    pub lethal_temperature: f64,
    pub lethal_temperature_month: u32,

    pub weather: bool,
    pub weather_size: usize,
    pub weather_type: WeatherType,

    pub reproductive_rate: f64,

    pub use_survival_rate: bool,
    pub survival_rate_month: u32,
    pub survival_rate_day: u32,

    pub model_type: ModelType,
    pub latency_period_steps: usize,

    /// When set, the natural kernel is realized as the deterministic
    /// probability-mass kernel instead of the stochastic radial sampler,
    /// for the same `natural_kernel_type` distribution.
    pub use_deterministic_kernel: bool,

    pub natural_kernel_type: DispersalKernelType,
    pub natural_scale: f64,
    pub natural_direction: Direction,
    pub natural_kappa: f64,

    pub use_anthropogenic_kernel: bool,
    pub percent_natural_dispersal: f64,
    pub anthro_kernel_type: DispersalKernelType,
    pub anthro_scale: f64,
    pub anthro_direction: Direction,
    pub anthro_kappa: f64,

    pub network_movement: NetworkMovement,
    pub network_min_time: f64,
    pub network_max_time: f64,
    pub network_allow_empty: bool,

    /// Shape parameter shared by distributions that need a second
    /// parameter (Weibull shape, power-law alpha, ...).
    pub shape: f64,

    pub use_treatments: bool,

    pub use_mortality: bool,
    pub mortality_frequency: MortalityFrequency,
    pub mortality_frequency_n: u32,
    pub mortality_rate: f64,
    pub mortality_time_lag: usize,

    pub use_quarantine: bool,
    pub quarantine_frequency: MortalityFrequency,
    pub quarantine_frequency_n: u32,

    pub use_movements: bool,

    pub dispersal_percentage: f64,

    pub output_frequency: MortalityFrequency,
    pub output_frequency_n: u32,

    pub use_spreadrates: bool,
    pub spreadrate_frequency: MortalityFrequency,
    pub spreadrate_frequency_n: u32,

    pub use_overpopulation_movements: bool,
    pub overpopulation_percentage: f64,
    pub leaving_percentage: f64,
    pub leaving_scale_coefficient: f64,

    pub dispersers_to_soils_percentage: f64,

    pub date_start: crate::date::Date,
    pub date_end: crate::date::Date,
    pub step_unit: StepUnit,
    pub step_num_units: u32,

    pub season_start_month: u32,
    pub season_end_month: u32,
}

/// Frequency kind shared by mortality/quarantine/output/spread-rate
/// scheduling (the source repeats this enum per feature; unified here
/// since the semantics are identical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MortalityFrequency {
    Year,
    Month,
    NSteps,
    EveryStep,
}

impl Config {
    /// Validate cross-field consistency. Called once by `Model::new`.
    pub fn validate(&self) -> Result<()> {
        if self.date_start >= self.date_end {
            return Err(PopsError::Configuration("date_start must be before date_end".into()));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(PopsError::Configuration("rows and cols must be positive".into()));
        }
        if self.model_type == ModelType::Sei && self.latency_period_steps == 0 {
            return Err(PopsError::Configuration(
                "SEI model requires latency_period_steps > 0".into(),
            ));
        }
        if self.use_mortality && self.mortality_rate <= 0.0 {
            return Err(PopsError::Configuration(
                "use_mortality is set but mortality_rate is not positive".into(),
            ));
        }
        if self.use_anthropogenic_kernel && !(0.0..=1.0).contains(&self.percent_natural_dispersal) {
            return Err(PopsError::Configuration(
                "percent_natural_dispersal must be in [0,1]".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.dispersal_percentage) {
            return Err(PopsError::Configuration("dispersal_percentage must be in [0,1)".into()));
        }
        if self.weather && self.weather_size == 0 {
            return Err(PopsError::Configuration(
                "weather is enabled but weather_size is zero".into(),
            ));
        }
        Ok(())
    }
}

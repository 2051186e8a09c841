//! The driver: orchestrates every subsystem for one simulation step.
//!
//! Grounded in SPEC_FULL.md §4.8 / §2's control-flow order, and the
//! teacher's `api.rs` `step_profiled` convention of returning a small
//! caller-facing result struct instead of requiring the caller to poke at
//! internal state after the call.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::environment::Environment;
use crate::error::Result;
use crate::generator::GeneratorProvider;
use crate::host_pool::{EstablishmentParams, GenerationParams, HostPool};
use crate::kernels::factory::{build_overpopulation_kernel, build_spread_kernel};
use crate::kernels::Kernel;
use crate::movements::{Movement, Movements};
use crate::network_graph::Network;
use crate::raster::Raster;
use crate::scheduler::{Scheduler, Season};
use crate::soil::SoilPool;
use crate::treatments::Treatments;

use crate::analytics::quarantine::QuarantineEscape;
use crate::analytics::spread_rate::SpreadRate;

/// Per-step result returned by [`Model::run_step`]: useful for caller-side
/// logging without reaching back into engine internals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepSummary {
    pub step_index: usize,
    pub new_infections: i32,
    pub new_deaths: i32,
    pub escaped: bool,
}

/// Everything one simulation run needs, owned in one place.
pub struct Model {
    config: Config,
    host_pool: HostPool,
    generator: GeneratorProvider,
    scheduler: Scheduler,
    season: Season,

    spread_mask: Vec<bool>,
    mortality_mask: Vec<bool>,
    quarantine_mask: Vec<bool>,
    spreadrate_mask: Vec<bool>,
    lethal_mask: Vec<bool>,
    survival_mask: Vec<bool>,
    weather_table: Vec<usize>,

    spread_kernel: Box<dyn Kernel>,
    overpopulation_kernel: Option<Box<dyn Kernel>>,
    #[allow(dead_code)]
    network: Option<Rc<Network>>,

    dispersers: Rc<RefCell<Raster<i32>>>,
    established_dispersers: Raster<i32>,
    outside_dispersers: Vec<(i32, i32)>,

    soil: Option<SoilPool>,
    treatments: Treatments,
    movements: Option<Movements>,

    weather_series: Vec<Raster<f64>>,
    lethal_temperature_series: Vec<Raster<f64>>,
    survival_rate_series: Vec<Raster<f64>>,
    quarantine_areas: Option<Raster<i32>>,

    spread_rate: Option<SpreadRate>,
    quarantine_escape: Option<QuarantineEscape>,
}

impl Model {
    /// Construct a model. `network_csv` is `(node_csv, segment_csv)`,
    /// required only if either kernel type is `Network`. `movements_table`
    /// is read only when `config.use_movements` is set; the caller is
    /// responsible for sorting it is not required (`Movements::new` sorts
    /// by `step_index` itself). `survival_rate_series` is read only when
    /// `config.use_survival_rate` is set, indexed by step like
    /// `lethal_temperature_series`.
    pub fn new(
        config: Config,
        susceptible: Raster<i32>,
        infected: Raster<i32>,
        total_population: Raster<i32>,
        weather_series: Vec<Raster<f64>>,
        lethal_temperature_series: Vec<Raster<f64>>,
        survival_rate_series: Vec<Raster<f64>>,
        quarantine_areas: Option<Raster<i32>>,
        network_csv: Option<(&str, &str)>,
        movements_table: Vec<Movement>,
    ) -> Result<Model> {
        config.validate()?;

        let network = match network_csv {
            Some((nodes, segments)) => {
                let mut net = Network::new();
                net.load_nodes(nodes, &config.bbox, config.ns_res, config.ew_res)?;
                net.load_segments(segments, &config.bbox, config.ns_res, config.ew_res)?;
                net.finalize(config.network_allow_empty)?;
                Some(Rc::new(net))
            }
            None => None,
        };

        let exposed_len = config.latency_period_steps + 1;
        let mortality_len = if config.mortality_rate > 0.0 {
            ((1.0 / config.mortality_rate).floor() as usize) + config.mortality_time_lag + 1
        } else {
            config.mortality_time_lag + 1
        };
        let host_pool = HostPool::new(config.model_type, exposed_len, mortality_len, &susceptible, &infected, total_population)?;

        let generator = GeneratorProvider::from_config(&config)?;
        let scheduler = Scheduler::new(config.date_start, config.date_end, config.step_unit, config.step_num_units)?;
        let season = Season { start_month: config.season_start_month, end_month: config.season_end_month };

        let spread_mask = scheduler.schedule_spread(&season);
        let mortality_mask = frequency_mask(&scheduler, config.mortality_frequency, config.mortality_frequency_n, &config);
        let quarantine_mask = frequency_mask(&scheduler, config.quarantine_frequency, config.quarantine_frequency_n, &config);
        let spreadrate_mask = frequency_mask(&scheduler, config.spreadrate_frequency, config.spreadrate_frequency_n, &config);
        let lethal_mask = if config.use_lethal_temperature {
            scheduler.schedule_action_yearly(config.lethal_temperature_month, 1)
        } else {
            Vec::new()
        };
        let survival_mask = if config.use_survival_rate {
            scheduler.schedule_action_yearly(config.survival_rate_month, config.survival_rate_day)
        } else {
            Vec::new()
        };
        let weather_table = scheduler.weather_table(config.weather_size);

        let dispersers = Rc::new(RefCell::new(Raster::new(config.rows, config.cols, config.ns_res, config.ew_res)));
        let established_dispersers = Raster::new(config.rows, config.cols, config.ns_res, config.ew_res);

        let spread_kernel = build_spread_kernel(&config, &dispersers, network.as_ref())?;
        let overpopulation_kernel = if config.use_overpopulation_movements {
            Some(build_overpopulation_kernel(&config, &dispersers, network.as_ref())?)
        } else {
            None
        };

        let soil = if config.dispersers_to_soils_percentage > 0.0 {
            Some(SoilPool::new(config.dispersers_to_soils_percentage))
        } else {
            None
        };

        let movements = if config.use_movements { Some(Movements::new(movements_table)) } else { None };

        let spread_rate = if config.use_spreadrates {
            Some(SpreadRate::new(config.rows, config.cols, config.ns_res, config.ew_res))
        } else {
            None
        };
        let quarantine_escape = if config.use_quarantine {
            quarantine_areas.as_ref().map(|areas| QuarantineEscape::new(areas, config.ns_res, config.ew_res))
        } else {
            None
        };

        Ok(Model {
            config,
            host_pool,
            generator,
            scheduler,
            season,
            spread_mask,
            mortality_mask,
            quarantine_mask,
            spreadrate_mask,
            lethal_mask,
            survival_mask,
            weather_table,
            spread_kernel,
            overpopulation_kernel,
            network,
            dispersers,
            established_dispersers,
            outside_dispersers: Vec::new(),
            soil,
            treatments: Treatments::new(),
            movements,
            weather_series,
            lethal_temperature_series,
            survival_rate_series,
            quarantine_areas,
            spread_rate,
            quarantine_escape,
        })
    }

    pub fn num_steps(&self) -> usize {
        self.scheduler.num_steps()
    }

    pub fn treatments_mut(&mut self) -> &mut Treatments {
        &mut self.treatments
    }

    pub fn movements_mut(&mut self) -> Option<&mut Movements> {
        self.movements.as_mut()
    }

    pub fn host_pool(&self) -> &HostPool {
        &self.host_pool
    }

    pub fn outside_dispersers(&self) -> &[(i32, i32)] {
        &self.outside_dispersers
    }

    pub fn spread_rate(&self) -> Option<&SpreadRate> {
        self.spread_rate.as_ref()
    }

    pub fn quarantine_escape(&self) -> Option<&QuarantineEscape> {
        self.quarantine_escape.as_ref()
    }

    /// Execute exactly one step of the control-flow order in §2: lethal-
    /// temperature purge -> survival-rate removal -> host movement -> spread
    /// -> overpopulation move -> treatments apply/expire -> mortality ->
    /// spread-rate compute -> quarantine compute.
    pub fn run_step(&mut self, step_index: usize) -> Result<StepSummary> {
        log::debug!("model: entering step {step_index}");

        let weather_idx = self.weather_table.get(step_index).copied();
        let weather_raster = weather_idx.and_then(|i| self.weather_series.get(i));
        let lethal_raster = self.lethal_temperature_series.get(step_index);
        let env = Environment::new(weather_raster, lethal_raster);

        // Lethal-temperature purge, gated by its own yearly schedule mask
        // rather than running on every step `use_lethal_temperature` is set.
        if self.config.use_lethal_temperature && self.lethal_mask.get(step_index).copied().unwrap_or(false) {
            log::trace!("model: lethal-temperature purge");
            let cells: Vec<(usize, usize)> = self.host_pool.suitable_cells().to_vec();
            for (row, col) in cells {
                if let Some(temp) = env.lethal_temperature_at(row, col) {
                    if temp < self.config.lethal_temperature {
                        let infected = self.host_pool.infected_at(row, col);
                        if infected > 0 {
                            self.host_pool
                                .remove_infected_at(row, col, infected, self.generator.lethal_temperature())?;
                        }
                        let exposed = self.host_pool.computed_exposed_at(row, col);
                        if exposed > 0 {
                            self.host_pool
                                .remove_exposed_at(row, col, exposed, self.generator.lethal_temperature())?;
                        }
                    }
                }
            }
        }

        // Survival-rate proportional removal: on its own yearly schedule,
        // shrink infected/exposed counts down to a raster-supplied survival
        // fraction rather than an all-or-nothing purge.
        if self.config.use_survival_rate && self.survival_mask.get(step_index).copied().unwrap_or(false) {
            if let Some(survival_rate) = self.survival_rate_series.get(step_index) {
                log::trace!("model: survival-rate removal");
                let cells: Vec<(usize, usize)> = self.host_pool.suitable_cells().to_vec();
                for (row, col) in cells {
                    let rate = *survival_rate.get(row, col);
                    if rate < 1.0 {
                        let infected = self.host_pool.infected_at(row, col);
                        let removed_infected = infected - (infected as f64 * rate).round() as i32;
                        if removed_infected > 0 {
                            self.host_pool
                                .remove_infected_at(row, col, removed_infected, self.generator.survival_rate())?;
                        }
                        let exposed = self.host_pool.computed_exposed_at(row, col);
                        let removed_exposed = exposed - (exposed as f64 * rate).round() as i32;
                        if removed_exposed > 0 {
                            self.host_pool
                                .remove_exposed_at(row, col, removed_exposed, self.generator.survival_rate())?;
                        }
                    }
                }
            }
        }

        // Host movement (scheduled table).
        if let Some(movements) = self.movements.as_mut() {
            log::trace!("model: host movement");
            movements.apply_through(step_index, &mut self.host_pool, self.generator.movement())?;
        }

        // Spread (generate + disperse).
        let mut new_infections = 0i32;
        if self.spread_mask.get(step_index).copied().unwrap_or(false) {
            log::trace!("model: spread");
            self.dispersers.replace(Raster::new(self.config.rows, self.config.cols, self.config.ns_res, self.config.ew_res));
            let generation = GenerationParams {
                reproductive_rate: self.config.reproductive_rate,
                stochastic: self.config.generate_stochasticity,
                competency: 1.0,
            };
            let establishment = EstablishmentParams {
                stochastic: self.config.establishment_stochasticity,
                probability: self.config.establishment_probability,
                competency: 1.0,
            };
            {
                let mut dispersers = self.dispersers.borrow_mut();
                crate::spread::run_spread_step(
                    &mut self.host_pool,
                    &mut dispersers,
                    &mut self.established_dispersers,
                    &mut self.outside_dispersers,
                    self.spread_kernel.as_mut(),
                    self.soil.as_mut(),
                    self.config.dispersers_to_soils_percentage,
                    &env,
                    generation,
                    establishment,
                    self.generator.general(),
                );
            }
            new_infections = self.established_dispersers.iter().filter(|&&v| v > 0).copied().sum();
        }

        // Overpopulation move.
        if self.config.use_overpopulation_movements && self.spread_mask.get(step_index).copied().unwrap_or(false) {
            if let Some(kernel) = self.overpopulation_kernel.as_mut() {
                log::trace!("model: overpopulation move");
                crate::spread::run_overpopulation_step(
                    &mut self.host_pool,
                    kernel.as_mut(),
                    self.config.overpopulation_percentage,
                    self.config.leaving_percentage,
                    self.generator.overpopulation(),
                );
            }
        }

        // Treatments apply/expire.
        if self.config.use_treatments && !self.treatments.is_empty() {
            log::trace!("model: treatments");
            let overlap = self.treatments.apply_step(step_index, &mut self.host_pool, self.generator.general());
            if overlap {
                log::warn!("model: a pesticide treatment returned more hosts to susceptible than it recorded as treated (overlapping pesticide treatments sharing cells)");
            }
        }

        // Mortality: apply and rotate the cohort ring buffer only on the
        // action's own schedule, not on every step `use_mortality` is set.
        let mut new_deaths = 0i32;
        if self.config.use_mortality && self.mortality_mask.get(step_index).copied().unwrap_or(false) {
            log::trace!("model: mortality");
            let cells: Vec<(usize, usize)> = self.host_pool.suitable_cells().to_vec();
            for (row, col) in cells {
                self.host_pool
                    .apply_mortality_at(row, col, self.config.mortality_rate, self.config.mortality_time_lag)?;
                new_deaths += self.host_pool.died_at(row, col);
            }
            self.host_pool.step_forward_mortality();
        }

        // SEI cohort aging happens every step regardless of mortality/
        // spread scheduling: it is continuous state evolution, not a
        // scheduled action.
        self.host_pool.step_forward(step_index, self.config.latency_period_steps);

        // Spread-rate compute.
        if self.spreadrate_mask.get(step_index).copied().unwrap_or(false) {
            if let Some(spread_rate) = self.spread_rate.as_mut() {
                log::trace!("model: spread-rate compute");
                let infected_cells = self.host_pool.suitable_cells().iter().copied().filter(|&(r, c)| self.host_pool.infected_at(r, c) > 0);
                spread_rate.record_step(infected_cells.collect::<Vec<_>>());
            }
        }

        // Quarantine compute.
        let mut escaped = false;
        if self.quarantine_mask.get(step_index).copied().unwrap_or(false) {
            if let (Some(quarantine), Some(areas)) = (self.quarantine_escape.as_mut(), self.quarantine_areas.as_ref()) {
                log::trace!("model: quarantine compute");
                let infected_cells: Vec<(usize, usize)> = self
                    .host_pool
                    .suitable_cells()
                    .iter()
                    .copied()
                    .filter(|&(r, c)| self.host_pool.infected_at(r, c) > 0)
                    .collect();
                quarantine.record_step(areas, infected_cells);
                escaped = quarantine.steps().last().map(|s| s.escaped).unwrap_or(false);
            }
        }

        log::debug!("model: leaving step {step_index} (new_infections={new_infections}, new_deaths={new_deaths})");
        Ok(StepSummary { step_index, new_infections, new_deaths, escaped })
    }
}

/// Translate the shared `MortalityFrequency` enum into a boolean mask for
/// whichever scheduled action it configures (mortality, quarantine, spread
/// rate, or output).
fn frequency_mask(scheduler: &Scheduler, frequency: crate::config::MortalityFrequency, n: u32, config: &Config) -> Vec<bool> {
    use crate::config::MortalityFrequency;
    match frequency {
        MortalityFrequency::Year => scheduler.schedule_action_yearly(config.season_start_month, 1),
        MortalityFrequency::Month => scheduler.schedule_action_monthly(),
        MortalityFrequency::NSteps => scheduler.schedule_action_nsteps(n.max(1)),
        MortalityFrequency::EveryStep => vec![true; scheduler.num_steps()],
    }
}

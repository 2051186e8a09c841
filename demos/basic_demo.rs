//! Basic demonstration of the PoPS simulation engine.
//!
//! Run with: cargo run --example basic_demo

use pops_sim::config::{Config, Direction, ModelType, MortalityFrequency, NetworkMovement, WeatherType};
use pops_sim::date::Date;
use pops_sim::kernels::DispersalKernelType;
use pops_sim::raster::{BBox, Raster};
use pops_sim::scheduler::StepUnit;
use pops_sim::Model;

fn main() {
    env_logger::init();
    println!("=== PoPS simulation demo ===\n");

    let rows = 10;
    let cols = 10;
    let mut s = vec![100; rows * cols];
    s[55] = 80;
    let susceptible = Raster::from_vec(rows, cols, 30.0, 30.0, s);
    let mut i = vec![0; rows * cols];
    i[55] = 20;
    let infected = Raster::from_vec(rows, cols, 30.0, 30.0, i);
    let total_population = Raster::from_vec(rows, cols, 30.0, 30.0, vec![100; rows * cols]);

    let config = Config {
        random_seed: 42,
        multiple_random_seeds: false,
        random_seeds: Default::default(),
        rows,
        cols,
        ew_res: 30.0,
        ns_res: 30.0,
        bbox: BBox::new(rows as f64 * 30.0, 0.0, cols as f64 * 30.0, 0.0),
        generate_stochasticity: true,
        establishment_stochasticity: true,
        movement_stochasticity: false,
        dispersal_stochasticity: true,
        establishment_probability: 0.5,
        use_lethal_temperature: false,
        lethal_temperature: -30.0,
        lethal_temperature_month: 1,
        weather: false,
        weather_size: 0,
        weather_type: WeatherType::Deterministic,
        reproductive_rate: 1.5,
        use_survival_rate: false,
        survival_rate_month: 1,
        survival_rate_day: 1,
        model_type: ModelType::Si,
        latency_period_steps: 0,
        use_deterministic_kernel: false,
        natural_kernel_type: DispersalKernelType::Cauchy,
        natural_scale: 20.0,
        natural_direction: Direction::None,
        natural_kappa: 0.0,
        use_anthropogenic_kernel: false,
        percent_natural_dispersal: 1.0,
        anthro_kernel_type: DispersalKernelType::Cauchy,
        anthro_scale: 20.0,
        anthro_direction: Direction::None,
        anthro_kappa: 0.0,
        network_movement: NetworkMovement::Walk,
        network_min_time: 0.0,
        network_max_time: 0.0,
        network_allow_empty: true,
        shape: 1.0,
        use_treatments: false,
        use_mortality: false,
        mortality_frequency: MortalityFrequency::Year,
        mortality_frequency_n: 1,
        mortality_rate: 0.0,
        mortality_time_lag: 0,
        use_quarantine: false,
        quarantine_frequency: MortalityFrequency::Year,
        quarantine_frequency_n: 1,
        use_movements: false,
        dispersal_percentage: 0.99,
        output_frequency: MortalityFrequency::Month,
        output_frequency_n: 1,
        use_spreadrates: true,
        spreadrate_frequency: MortalityFrequency::Month,
        spreadrate_frequency_n: 1,
        use_overpopulation_movements: false,
        overpopulation_percentage: 0.0,
        leaving_percentage: 0.0,
        leaving_scale_coefficient: 1.0,
        dispersers_to_soils_percentage: 0.0,
        date_start: Date::new(2020, 1, 1),
        date_end: Date::new(2021, 1, 1),
        step_unit: StepUnit::Month,
        step_num_units: 1,
        season_start_month: 3,
        season_end_month: 10,
    };

    let mut model = Model::new(config, susceptible, infected, total_population, Vec::new(), Vec::new(), Vec::new(), None, None, Vec::new())
        .expect("valid config");

    println!("Initial state:");
    print_summary(&model);

    for step in 0..model.num_steps() {
        let summary = model.run_step(step).expect("step runs");
        if (step + 1) % 3 == 0 {
            println!(
                "--- step {} (new_infections={}, new_deaths={}) ---",
                summary.step_index, summary.new_infections, summary.new_deaths
            );
            print_summary(&model);
        }
    }

    if let Some(spread_rate) = model.spread_rate() {
        let average = pops_sim::analytics::spread_rate::average_spread_rate(&[spread_rate.rates().to_vec()]);
        if let Some(average) = average.last() {
            println!("\n=== Average spread rate (map units/step) ===");
            println!(
                "north={:.2} south={:.2} east={:.2} west={:.2}",
                average.north, average.south, average.east, average.west
            );
        }
    }
}

fn print_summary(model: &Model) {
    let total_infected: i32 = model
        .host_pool()
        .suitable_cells()
        .iter()
        .map(|&(r, c)| model.host_pool().infected_at(r, c))
        .sum();
    let total_susceptible: i32 = model
        .host_pool()
        .suitable_cells()
        .iter()
        .map(|&(r, c)| model.host_pool().susceptible_at(r, c))
        .sum();
    println!("  total susceptible={total_susceptible} total infected={total_infected} outside_dispersers={}", model.outside_dispersers().len());
}

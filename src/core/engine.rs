use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::error::ScenarioError;
use super::returns::{ANNUAL_RETURN_STANDARD_DEVIATION, volatile_return};
use super::types::{
    PercentilePathPoint, Scenario, SimulationIterationResult, SimulationResult,
    WithdrawalIndexation, YearResult,
};

pub const BLACK_SWAN_MIN_LOSS: f64 = 0.25;
pub const BLACK_SWAN_MAX_LOSS: f64 = 0.50;

pub fn run_simulation(
    scenario: &Scenario,
    iterations: u32,
) -> Result<SimulationResult, ScenarioError> {
    run_simulation_seeded(scenario, iterations, rand::random())
}

pub fn run_simulation_seeded(
    scenario: &Scenario,
    iterations: u32,
    seed: u64,
) -> Result<SimulationResult, ScenarioError> {
    scenario.validate()?;
    let iterations = effective_iterations(iterations);
    let started = Instant::now();
    info!(iterations, seed, "starting simulation");

    let results: Vec<SimulationIterationResult> = (0..iterations)
        .into_par_iter()
        .map(|iteration_id| {
            let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, iteration_id));
            simulate_iteration(scenario, &mut rng)
        })
        .collect();

    let mut result = aggregate(scenario, &results);
    result.seed = Some(seed);
    info!(
        iterations,
        seed,
        success_rate = result.success_rate,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );
    Ok(result)
}

pub fn run_simulation_with_rng<R: Rng + ?Sized>(
    scenario: &Scenario,
    iterations: u32,
    rng: &mut R,
) -> Result<SimulationResult, ScenarioError> {
    scenario.validate()?;
    let iterations = effective_iterations(iterations);
    let results = (0..iterations)
        .map(|_| simulate_iteration(scenario, &mut *rng))
        .collect::<Vec<_>>();
    Ok(aggregate(scenario, &results))
}

fn effective_iterations(iterations: u32) -> u32 {
    if iterations == 0 {
        warn!("zero iterations requested, running a single iteration");
        return 1;
    }
    iterations
}

pub fn simulate_iteration<R: Rng + ?Sized>(
    scenario: &Scenario,
    rng: &mut R,
) -> SimulationIterationResult {
    let horizon = scenario.horizon_years();
    let mean_return = scenario.expected_annual_return / 100.0;
    let black_swan_probability = scenario.black_swan_probability / 100.0;

    let mut portfolio_value = scenario.portfolio_value;
    let mut years = Vec::with_capacity(horizon as usize + 1);
    years.push(YearResult {
        year: 0,
        portfolio_value,
        black_swan: false,
        black_swan_loss: 0.0,
    });

    for year in 0..horizon {
        let age = scenario.current_age + year;
        if age < scenario.retirement_age {
            portfolio_value += scenario.monthly_contribution * 12.0;
        } else {
            portfolio_value = (portfolio_value - withdrawal_for_year(scenario, year)).max(0.0);
        }

        let black_swan = rng.random::<f64>() < black_swan_probability;
        let black_swan_loss = if black_swan {
            BLACK_SWAN_MIN_LOSS + rng.random::<f64>() * (BLACK_SWAN_MAX_LOSS - BLACK_SWAN_MIN_LOSS)
        } else {
            0.0
        };

        if black_swan {
            portfolio_value -= portfolio_value * black_swan_loss;
        } else {
            let annual_return =
                volatile_return(rng, mean_return, ANNUAL_RETURN_STANDARD_DEVIATION).max(-1.0);
            portfolio_value += portfolio_value * annual_return;
        }

        years.push(YearResult {
            year: year + 1,
            portfolio_value,
            black_swan,
            black_swan_loss,
        });
    }

    let total_black_swans = years.iter().filter(|y| y.black_swan).count() as u32;
    SimulationIterationResult {
        scenario: scenario.clone(),
        years,
        portfolio_value,
        success: portfolio_value > 0.0,
        total_black_swans,
    }
}

fn withdrawal_for_year(scenario: &Scenario, years_since_start: u32) -> f64 {
    match scenario.withdrawal_indexation {
        WithdrawalIndexation::Flat => scenario.annual_withdrawal,
        WithdrawalIndexation::Inflation => {
            let inflation = scenario.inflation_rate / 100.0;
            scenario.annual_withdrawal * (1.0 + inflation).powi(years_since_start as i32)
        }
    }
}

struct PathAccumulator {
    ages: Vec<u32>,
    values: Vec<Vec<f64>>,
    successes: u32,
    black_swans: u64,
    samples: u32,
}

impl PathAccumulator {
    fn new(ages: Vec<u32>, expected_samples: usize) -> Self {
        let values = (0..ages.len())
            .map(|_| Vec::with_capacity(expected_samples))
            .collect();
        Self {
            ages,
            values,
            successes: 0,
            black_swans: 0,
            samples: 0,
        }
    }

    fn push(&mut self, iteration: &SimulationIterationResult) {
        for (idx, year) in iteration.years.iter().enumerate().take(self.ages.len()) {
            self.values[idx].push(year.portfolio_value);
        }
        if iteration.success {
            self.successes += 1;
        }
        self.black_swans += u64::from(iteration.total_black_swans);
        self.samples += 1;
    }

    fn into_paths(self) -> Vec<PercentilePathPoint> {
        self.ages
            .into_iter()
            .zip(self.values)
            .map(|(age, mut values)| {
                values.sort_by(|a, b| a.total_cmp(b));
                PercentilePathPoint {
                    age,
                    worst: percentile(&values, 0.0),
                    percentile10: percentile(&values, 10.0),
                    percentile50: percentile(&values, 50.0),
                    percentile90: percentile(&values, 90.0),
                    best: percentile(&values, 100.0),
                }
            })
            .collect()
    }
}

fn aggregate(scenario: &Scenario, results: &[SimulationIterationResult]) -> SimulationResult {
    let ages = (scenario.current_age..=scenario.life_expectancy).collect::<Vec<_>>();
    let mut acc = PathAccumulator::new(ages, results.len());
    for iteration in results {
        acc.push(iteration);
    }

    let samples = acc.samples.max(1) as f64;
    let iterations = acc.samples;
    let success_rate = acc.successes as f64 / samples;
    let average_black_swans = acc.black_swans as f64 / samples;
    let paths = acc.into_paths();
    debug!(ages = paths.len(), iterations, "aggregated percentile paths");

    SimulationResult {
        scenario: scenario.clone(),
        iterations,
        seed: None,
        success_rate,
        average_black_swans,
        paths,
    }
}

// sorted[floor(n * p / 100)], clamped to the last element.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p / 100.0).floor().max(0.0) as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn derive_seed(base_seed: u64, iteration_id: u32) -> u64 {
    splitmix64(base_seed ^ u64::from(iteration_id))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

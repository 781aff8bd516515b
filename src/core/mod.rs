mod chart;
mod currency;
mod engine;
mod error;
mod insights;
mod returns;
#[cfg(test)]
mod test_support;
mod types;

pub use chart::y_axis_max;
pub use currency::CurrencyFormatter;
pub use engine::{
    BLACK_SWAN_MAX_LOSS, BLACK_SWAN_MIN_LOSS, percentile, run_simulation, run_simulation_seeded,
    run_simulation_with_rng, simulate_iteration,
};
pub use error::ScenarioError;
pub use insights::{InsightsData, derive_insights, derive_insights_with, insights_data};
pub use returns::{ANNUAL_RETURN_STANDARD_DEVIATION, volatile_return};
pub use types::{
    Insight, InsightStatus, PercentilePathPoint, Scenario, SimulationIterationResult,
    SimulationResult, WithdrawalIndexation, YearResult,
};

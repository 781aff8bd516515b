use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("life expectancy ({life_expectancy}) must be greater than current age ({current_age})")]
    NonPositiveHorizon {
        current_age: u32,
        life_expectancy: u32,
    },
    #[error("retirement age ({retirement_age}) must not be before current age ({current_age})")]
    RetirementBeforeCurrentAge {
        current_age: u32,
        retirement_age: u32,
    },
    #[error("{field} must be a finite amount >= 0, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("black swan probability must be between 0 and 100 percent, got {0}")]
    ProbabilityOutOfRange(f64),
    #[error("{field} must be finite")]
    NonFiniteRate { field: &'static str },
    #[error("{field} must be greater than -100 percent, got {value}")]
    RateAtOrBelowFloor { field: &'static str, value: f64 },
}

use serde::{Deserialize, Serialize};

use super::error::ScenarioError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalIndexation {
    #[default]
    Flat,
    Inflation,
}

// Rates are in percent, e.g. 7.0 for 7%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub portfolio_value: f64,
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub annual_withdrawal: f64,
    pub black_swan_probability: f64,
    pub monthly_contribution: f64,
    pub expected_annual_return: f64,
    pub inflation_rate: f64,
    #[serde(default)]
    pub withdrawal_indexation: WithdrawalIndexation,
}

impl Scenario {
    pub fn horizon_years(&self) -> u32 {
        self.life_expectancy.saturating_sub(self.current_age)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.life_expectancy <= self.current_age {
            return Err(ScenarioError::NonPositiveHorizon {
                current_age: self.current_age,
                life_expectancy: self.life_expectancy,
            });
        }

        if self.retirement_age < self.current_age {
            return Err(ScenarioError::RetirementBeforeCurrentAge {
                current_age: self.current_age,
                retirement_age: self.retirement_age,
            });
        }

        for (field, amount) in [
            ("portfolioValue", self.portfolio_value),
            ("annualWithdrawal", self.annual_withdrawal),
            ("monthlyContribution", self.monthly_contribution),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ScenarioError::InvalidAmount { field, value: amount });
            }
        }

        if !(0.0..=100.0).contains(&self.black_swan_probability) {
            return Err(ScenarioError::ProbabilityOutOfRange(self.black_swan_probability));
        }

        for (field, rate) in [
            ("expectedAnnualReturn", self.expected_annual_return),
            ("inflationRate", self.inflation_rate),
        ] {
            if !rate.is_finite() {
                return Err(ScenarioError::NonFiniteRate { field });
            }
            if rate <= -100.0 {
                return Err(ScenarioError::RateAtOrBelowFloor { field, value: rate });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub year: u32,
    pub portfolio_value: f64,
    pub black_swan: bool,
    pub black_swan_loss: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationIterationResult {
    pub scenario: Scenario,
    pub years: Vec<YearResult>,
    pub portfolio_value: f64,
    pub success: bool,
    pub total_black_swans: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentilePathPoint {
    pub age: u32,
    pub worst: f64,
    pub percentile10: f64,
    pub percentile50: f64,
    pub percentile90: f64,
    pub best: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub scenario: Scenario,
    pub iterations: u32,
    pub seed: Option<u64>,
    pub success_rate: f64,
    pub average_black_swans: f64,
    pub paths: Vec<PercentilePathPoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub id: &'static str,
    pub title: &'static str,
    pub status: InsightStatus,
    pub message: String,
}

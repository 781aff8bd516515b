use serde::Serialize;

use super::currency::CurrencyFormatter;
use super::types::{Insight, InsightStatus, PercentilePathPoint, SimulationResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsData {
    pub median_at_life_expectancy: f64,
    pub median_met_life_expectancy: bool,
    pub median_at_retirement: f64,
    pub peak_age: u32,
    pub peak_value: f64,
    pub median_runs_out_age: Option<u32>,
    pub worst_case_runs_out_age: Option<u32>,
    pub worst_case_fails: bool,
    pub tenth_percentile_runs_out_age: Option<u32>,
    pub tenth_percentile_fails: bool,
    pub years_in_retirement: u32,
}

pub fn insights_data(result: &SimulationResult) -> Option<InsightsData> {
    let scenario = &result.scenario;
    let paths = &result.paths;
    let last = paths.last()?;
    let first = paths.first()?;

    let median_at_life_expectancy = last.percentile50;
    let median_at_retirement = paths
        .iter()
        .find(|p| p.age == scenario.retirement_age)
        .unwrap_or(first)
        .percentile50;

    let peak = paths.iter().fold(first, |peak, p| {
        if p.percentile50 > peak.percentile50 {
            p
        } else {
            peak
        }
    });

    let worst_case_runs_out_age = first_depleted_age(paths, |p| p.worst);
    let tenth_percentile_runs_out_age = first_depleted_age(paths, |p| p.percentile10);

    Some(InsightsData {
        median_at_life_expectancy,
        median_met_life_expectancy: median_at_life_expectancy > 0.0,
        median_at_retirement,
        peak_age: peak.age,
        peak_value: peak.percentile50,
        median_runs_out_age: first_depleted_age(paths, |p| p.percentile50),
        worst_case_runs_out_age,
        worst_case_fails: worst_case_runs_out_age.is_some_and(|age| age < scenario.life_expectancy),
        tenth_percentile_runs_out_age,
        tenth_percentile_fails: tenth_percentile_runs_out_age
            .is_some_and(|age| age < scenario.life_expectancy),
        years_in_retirement: scenario
            .life_expectancy
            .saturating_sub(scenario.retirement_age),
    })
}

fn first_depleted_age(
    paths: &[PercentilePathPoint],
    series: impl Fn(&PercentilePathPoint) -> f64,
) -> Option<u32> {
    paths.iter().find(|p| series(p) <= 0.0).map(|p| p.age)
}

pub fn derive_insights(result: &SimulationResult) -> Vec<Insight> {
    derive_insights_with(result, &CurrencyFormatter::default())
}

pub fn derive_insights_with(result: &SimulationResult, currency: &CurrencyFormatter) -> Vec<Insight> {
    let Some(data) = insights_data(result) else {
        return Vec::new();
    };
    let life_expectancy = result.scenario.life_expectancy;

    let goal_message = if data.median_met_life_expectancy {
        format!(
            "Your median scenario successfully reaches age {life_expectancy} with {} remaining.",
            currency.format(data.median_at_life_expectancy)
        )
    } else {
        let runs_out_age = data.median_runs_out_age.unwrap_or(life_expectancy);
        format!(
            "Your median scenario runs out of funds at age {runs_out_age}, {} years before your life expectancy.",
            life_expectancy.saturating_sub(runs_out_age)
        )
    };

    let mut insights = vec![
        Insight {
            id: "life-expectancy-goal",
            title: "Life Expectancy Goal",
            status: if data.median_met_life_expectancy {
                InsightStatus::Success
            } else {
                InsightStatus::Warning
            },
            message: goal_message,
        },
        Insight {
            id: "portfolio-at-retirement",
            title: "Portfolio at Retirement",
            status: InsightStatus::Info,
            message: format!(
                "At age {}, your median portfolio value is projected to be {}.",
                result.scenario.retirement_age,
                currency.format(data.median_at_retirement)
            ),
        },
        Insight {
            id: "peak-portfolio-value",
            title: "Peak Portfolio Value",
            status: InsightStatus::Info,
            message: format!(
                "Your median portfolio reaches its peak value of {} at age {}.",
                currency.format(data.peak_value),
                data.peak_age
            ),
        },
    ];

    if let (true, Some(age)) = (data.worst_case_fails, data.worst_case_runs_out_age) {
        insights.push(Insight {
            id: "worst-case-scenario",
            title: "Worst Case Scenario",
            status: InsightStatus::Warning,
            message: format!(
                "In the worst case scenario, your portfolio runs out at age {age}, {} years before your life expectancy.",
                life_expectancy - age
            ),
        });
    }

    if let (true, Some(age)) = (data.tenth_percentile_fails, data.tenth_percentile_runs_out_age) {
        insights.push(Insight {
            id: "lower-percentile-risk",
            title: "Lower Percentile Risk",
            status: InsightStatus::Warning,
            message: format!(
                "In 10% of scenarios, your portfolio runs out at age {age}, {} years before your life expectancy.",
                life_expectancy - age
            ),
        });
    }

    if data.median_met_life_expectancy && !data.worst_case_fails {
        insights.push(Insight {
            id: "retirement-duration",
            title: "Retirement Duration",
            status: InsightStatus::Success,
            message: format!(
                "Your plan covers {} years of retirement, and even the worst case scenario maintains funds through your life expectancy.",
                data.years_in_retirement
            ),
        });
    }

    insights
}

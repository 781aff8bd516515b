use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::{
    CurrencyFormatter, Insight, InsightStatus, InsightsData, PercentilePathPoint, Scenario,
    ScenarioError, SimulationResult, WithdrawalIndexation, derive_insights_with, insights_data,
    run_simulation, run_simulation_seeded, y_axis_max,
};

const MAX_ITERATIONS: u32 = 200_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliWithdrawalIndexation {
    Flat,
    Inflation,
}

impl From<CliWithdrawalIndexation> for WithdrawalIndexation {
    fn from(value: CliWithdrawalIndexation) -> Self {
        match value {
            CliWithdrawalIndexation::Flat => WithdrawalIndexation::Flat,
            CliWithdrawalIndexation::Inflation => WithdrawalIndexation::Inflation,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiWithdrawalIndexation {
    #[serde(alias = "none", alias = "fixed")]
    Flat,
    #[serde(alias = "inflation-adjusted", alias = "inflationAdjusted", alias = "indexed")]
    Inflation,
}

impl From<ApiWithdrawalIndexation> for CliWithdrawalIndexation {
    fn from(value: ApiWithdrawalIndexation) -> Self {
        match value {
            ApiWithdrawalIndexation::Flat => CliWithdrawalIndexation::Flat,
            ApiWithdrawalIndexation::Inflation => CliWithdrawalIndexation::Inflation,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    portfolio_value: Option<f64>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    life_expectancy: Option<u32>,
    annual_withdrawal: Option<f64>,
    black_swan_probability: Option<f64>,
    monthly_contribution: Option<f64>,
    expected_annual_return: Option<f64>,
    inflation_rate: Option<f64>,
    withdrawal_indexation: Option<ApiWithdrawalIndexation>,

    iterations: Option<u32>,
    seed: Option<u64>,
    currency_symbol: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Monte Carlo retirement projection with black swan shocks",
    after_help = "Run `nestegg serve [port]` to start the HTTP API instead."
)]
struct Cli {
    #[arg(long, default_value_t = 100_000.0, help = "Current portfolio value")]
    portfolio_value: f64,
    #[arg(long, default_value_t = 30)]
    current_age: u32,
    #[arg(long, default_value_t = 65)]
    retirement_age: u32,
    #[arg(long, default_value_t = 90, help = "Age to project through")]
    life_expectancy: u32,
    #[arg(
        long,
        default_value_t = 40_000.0,
        help = "Annual withdrawal once retired"
    )]
    annual_withdrawal: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Yearly probability of a black swan loss in percent"
    )]
    black_swan_probability: f64,
    #[arg(
        long,
        default_value_t = 1_000.0,
        help = "Monthly contribution until retirement"
    )]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual return in percent, e.g. 7"
    )]
    expected_annual_return: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliWithdrawalIndexation::Flat,
        help = "Keep withdrawals flat or grow them with inflation"
    )]
    withdrawal_indexation: CliWithdrawalIndexation,
    #[arg(long, default_value_t = 10_000)]
    iterations: u32,
    #[arg(long, help = "Seed for a reproducible run; random when omitted")]
    seed: Option<u64>,
    #[arg(long, default_value = "£", help = "Symbol used when formatting amounts")]
    currency_symbol: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone)]
struct RunOptions {
    iterations: u32,
    seed: Option<u64>,
    currency_symbol: String,
}

#[derive(Debug)]
struct ApiRequest {
    scenario: Scenario,
    options: RunOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    scenario: Scenario,
    iterations: u32,
    seed: Option<u64>,
    success_rate: f64,
    average_black_swans: f64,
    y_axis_max: f64,
    paths: Vec<PercentilePathPoint>,
    insights: Vec<Insight>,
    summary: Option<InsightsData>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> Result<ApiRequest, String> {
    if cli.iterations == 0 {
        return Err("--iterations must be > 0".to_string());
    }

    if cli.iterations > MAX_ITERATIONS {
        return Err(format!("--iterations must be <= {MAX_ITERATIONS}"));
    }

    let scenario = Scenario {
        portfolio_value: cli.portfolio_value,
        current_age: cli.current_age,
        retirement_age: cli.retirement_age,
        life_expectancy: cli.life_expectancy,
        annual_withdrawal: cli.annual_withdrawal,
        black_swan_probability: cli.black_swan_probability,
        monthly_contribution: cli.monthly_contribution,
        expected_annual_return: cli.expected_annual_return,
        inflation_rate: cli.inflation_rate,
        withdrawal_indexation: cli.withdrawal_indexation.into(),
    };
    scenario.validate().map_err(|e| flag_error(&e))?;

    Ok(ApiRequest {
        scenario,
        options: RunOptions {
            iterations: cli.iterations,
            seed: cli.seed,
            currency_symbol: cli.currency_symbol,
        },
    })
}

fn flag_error(err: &ScenarioError) -> String {
    match err {
        ScenarioError::NonPositiveHorizon { .. } => {
            "--life-expectancy must be > --current-age".to_string()
        }
        ScenarioError::RetirementBeforeCurrentAge { .. } => {
            "--retirement-age must be >= --current-age".to_string()
        }
        ScenarioError::InvalidAmount { field, .. } => format!("{} must be >= 0", flag_name(field)),
        ScenarioError::ProbabilityOutOfRange(_) => {
            "--black-swan-probability must be between 0 and 100".to_string()
        }
        ScenarioError::NonFiniteRate { field }
        | ScenarioError::RateAtOrBelowFloor { field, .. } => {
            format!("{} must be > -100", flag_name(field))
        }
    }
}

// portfolioValue -> --portfolio-value
fn flag_name(field: &str) -> String {
    let mut flag = String::from("--");
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            flag.push('-');
            flag.push(c.to_ascii_lowercase());
        } else {
            flag.push(c);
        }
    }
    flag
}

fn execute(request: &ApiRequest) -> Result<SimulateResponse, String> {
    let result = match request.options.seed {
        Some(seed) => run_simulation_seeded(&request.scenario, request.options.iterations, seed),
        None => run_simulation(&request.scenario, request.options.iterations),
    }
    .map_err(|e| e.to_string())?;

    let currency = CurrencyFormatter::new(request.options.currency_symbol.as_str());
    Ok(build_simulate_response(result, &currency))
}

fn build_simulate_response(result: SimulationResult, currency: &CurrencyFormatter) -> SimulateResponse {
    let insights = derive_insights_with(&result, currency);
    let summary = insights_data(&result);
    SimulateResponse {
        y_axis_max: y_axis_max(&result.paths),
        iterations: result.iterations,
        seed: result.seed,
        success_rate: result.success_rate,
        average_black_swans: result.average_black_swans,
        scenario: result.scenario,
        paths: result.paths,
        insights,
        summary,
    }
}

pub fn run_cli(raw_args: Vec<String>) -> Result<(), String> {
    let cli = Cli::parse_from(raw_args);
    let format = cli.format;
    let currency = CurrencyFormatter::new(cli.currency_symbol.as_str());
    let request = build_request(cli)?;
    let response = execute(&request)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", render_text_report(&response, &currency)),
    }
    Ok(())
}

fn render_text_report(response: &SimulateResponse, currency: &CurrencyFormatter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} iterations, seed {}, success rate {:.1}%, {:.2} black swans per lifetime",
        response.iterations,
        response
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        response.success_rate * 100.0,
        response.average_black_swans
    );
    let _ = writeln!(
        out,
        "{:>4} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "age", "worst", "p10", "median", "p90", "best"
    );
    for point in &response.paths {
        let _ = writeln!(
            out,
            "{:>4} {:>10} {:>10} {:>10} {:>10} {:>10}",
            point.age,
            currency.format_compact(point.worst),
            currency.format_compact(point.percentile10),
            currency.format_compact(point.percentile50),
            currency.format_compact(point.percentile90),
            currency.format_compact(point.best),
        );
    }
    let _ = writeln!(out);
    for insight in &response.insights {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            status_label(insight),
            insight.title,
            insight.message
        );
    }
    out
}

fn status_label(insight: &Insight) -> &'static str {
    match insight.status {
        InsightStatus::Success => "ok",
        InsightStatus::Warning => "warn",
        InsightStatus::Info => "info",
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retirement simulation API listening");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match tokio::task::spawn_blocking(move || execute(&request)).await {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(msg)) => {
            warn!(error = %msg, "simulation rejected scenario");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
        Err(e) => {
            error!(error = %e, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.portfolio_value {
        cli.portfolio_value = v;
    }
    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        cli.life_expectancy = v;
    }
    if let Some(v) = payload.annual_withdrawal {
        cli.annual_withdrawal = v;
    }
    if let Some(v) = payload.black_swan_probability {
        cli.black_swan_probability = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.expected_annual_return {
        cli.expected_annual_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.withdrawal_indexation {
        cli.withdrawal_indexation = v.into();
    }

    if let Some(v) = payload.iterations {
        cli.iterations = v;
    }
    if payload.seed.is_some() {
        cli.seed = payload.seed;
    }
    if let Some(v) = payload.currency_symbol {
        if v.chars().count() > 4 {
            return Err("currencySymbol must be at most 4 characters".to_string());
        }
        cli.currency_symbol = v;
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        portfolio_value: 100_000.0,
        current_age: 30,
        retirement_age: 65,
        life_expectancy: 90,
        annual_withdrawal: 40_000.0,
        black_swan_probability: 5.0,
        monthly_contribution: 1_000.0,
        expected_annual_return: 7.0,
        inflation_rate: 2.5,
        withdrawal_indexation: CliWithdrawalIndexation::Flat,
        iterations: 10_000,
        seed: None,
        currency_symbol: "£".to_string(),
        format: OutputFormat::Json,
    }
}

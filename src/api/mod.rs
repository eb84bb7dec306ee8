use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    AbsorbedCosts, EntityType, FundInput, FundReport, ReferenceData, ResourceDistribution,
    SimulatorInputs, SimulatorResult, StaffMember, absorbed_stable_uses, calculate,
    run_simulator, threshold_percent, with_absorbed_stable_uses, with_derived_fields,
};
use crate::error::FundError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliEntityType {
    Municipality,
    Province,
    MunicipalUnion,
    MountainCommunity,
    Other,
}

impl From<CliEntityType> for EntityType {
    fn from(value: CliEntityType) -> Self {
        match value {
            CliEntityType::Municipality => EntityType::Municipality,
            CliEntityType::Province => EntityType::Province,
            CliEntityType::MunicipalUnion => EntityType::MunicipalUnion,
            CliEntityType::MountainCommunity => EntityType::MountainCommunity,
            CliEntityType::Other => EntityType::Other,
        }
    }
}

impl From<EntityType> for CliEntityType {
    fn from(value: EntityType) -> Self {
        match value {
            EntityType::Municipality => CliEntityType::Municipality,
            EntityType::Province => CliEntityType::Province,
            EntityType::MunicipalUnion => CliEntityType::MunicipalUnion,
            EntityType::MountainCommunity => CliEntityType::MountainCommunity,
            EntityType::Other => CliEntityType::Other,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fondo-accessorio",
    about = "Accessory compensation fund calculator for Italian local bodies (2016 ceiling, increment simulator, compliance checks)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log only warnings and errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Reference data JSON; defaults to the bundled table
    #[arg(long, global = true)]
    reference: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Compute the fund and its compliance checks from an input snapshot
    Calculate {
        /// FundInput JSON file
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
        /// Also print the snapshot with the mirrored fields written back
        #[arg(long)]
        derived: bool,
    },
    /// Run the five-phase increment simulator
    Simulate(SimulateArgs),
    /// Stable costs absorbed by the staff in service
    StaffCosts {
        /// FundInput JSON file
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
        /// Print the distribution ledger with the absorbed costs written in
        #[arg(long)]
        write_back: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    #[arg(long, default_value_t = 0.0, help = "2023 tabular salary spend, non-executive staff")]
    tabular_salaries_2023: f64,
    #[arg(long, default_value_t = 0.0)]
    current_stable_fund: f64,
    #[arg(long, default_value_t = 0.0)]
    current_high_qualification_resources: f64,
    #[arg(long, default_value_t = 0.0, help = "Consolidated personnel expense 2023")]
    personnel_expense_2023: f64,
    #[arg(long, default_value_t = 0.0, help = "Average current revenue, last three statements")]
    average_current_revenue: f64,
    #[arg(long, default_value_t = 0.0)]
    historical_expense_ceiling: f64,
    #[arg(long, default_value_t = 0.0)]
    planned_hiring_cost: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Employer charges on the increment in percent, e.g. 27.4"
    )]
    overhead_rate: f64,
    #[arg(long)]
    population: Option<u32>,
    #[arg(long, value_enum)]
    entity_type: Option<CliEntityType>,
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    tabular_salaries_2023: Option<f64>,
    current_stable_fund: Option<f64>,
    current_high_qualification_resources: Option<f64>,
    personnel_expense_2023: Option<f64>,
    average_current_revenue: Option<f64>,
    historical_expense_ceiling: Option<f64>,
    planned_hiring_cost: Option<f64>,
    overhead_rate: Option<f64>,
    population: Option<u32>,
    entity_type: Option<EntityType>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SimulateRequest {
    inputs: SimulatorInputs,
    population: Option<u32>,
    entity_type: Option<EntityType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculateOptions {
    derived: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StaffCostsPayload {
    reference_year: u16,
    staff: Vec<StaffMember>,
    distribution: Option<ResourceDistribution>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    #[serde(flatten)]
    report: FundReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    derived_input: Option<FundInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    threshold_percent: f64,
    result: SimulatorResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StaffCostsResponse {
    absorbed: AbsorbedCosts,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<ResourceDistribution>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared by every request; the table is never written after start-up.
#[derive(Clone, Default)]
struct AppState {
    reference: Option<Arc<ReferenceData>>,
}

impl AppState {
    fn reference(&self) -> Result<&ReferenceData, Response> {
        self.reference
            .as_deref()
            .ok_or_else(|| fund_error_response(&FundError::ReferenceDataUnavailable))
    }
}

fn build_simulate_request(args: &SimulateArgs) -> Result<SimulateRequest, String> {
    for (name, value) in [
        ("--tabular-salaries-2023", args.tabular_salaries_2023),
        ("--current-stable-fund", args.current_stable_fund),
        (
            "--current-high-qualification-resources",
            args.current_high_qualification_resources,
        ),
        ("--personnel-expense-2023", args.personnel_expense_2023),
        ("--average-current-revenue", args.average_current_revenue),
        ("--historical-expense-ceiling", args.historical_expense_ceiling),
        ("--planned-hiring-cost", args.planned_hiring_cost),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if !args.overhead_rate.is_finite() {
        return Err("--overhead-rate must be a finite percentage".to_string());
    }

    Ok(SimulateRequest {
        inputs: SimulatorInputs {
            tabular_salaries_2023: Some(args.tabular_salaries_2023),
            current_stable_fund: Some(args.current_stable_fund),
            current_high_qualification_resources: Some(args.current_high_qualification_resources),
            personnel_expense_2023: Some(args.personnel_expense_2023),
            average_current_revenue: Some(args.average_current_revenue),
            historical_expense_ceiling: Some(args.historical_expense_ceiling),
            planned_hiring_cost: Some(args.planned_hiring_cost),
            overhead_rate_percent: Some(args.overhead_rate),
        },
        population: args.population,
        entity_type: args.entity_type.map(Into::into),
    })
}

fn default_simulate_args_for_api() -> SimulateArgs {
    SimulateArgs {
        tabular_salaries_2023: 0.0,
        current_stable_fund: 0.0,
        current_high_qualification_resources: 0.0,
        personnel_expense_2023: 0.0,
        average_current_revenue: 0.0,
        historical_expense_ceiling: 0.0,
        planned_hiring_cost: 0.0,
        overhead_rate: 0.0,
        population: None,
        entity_type: None,
        pretty: false,
    }
}

fn simulate_request_from_payload(payload: SimulatePayload) -> Result<SimulateRequest, String> {
    let mut args = default_simulate_args_for_api();

    if let Some(v) = payload.tabular_salaries_2023 {
        args.tabular_salaries_2023 = v;
    }
    if let Some(v) = payload.current_stable_fund {
        args.current_stable_fund = v;
    }
    if let Some(v) = payload.current_high_qualification_resources {
        args.current_high_qualification_resources = v;
    }
    if let Some(v) = payload.personnel_expense_2023 {
        args.personnel_expense_2023 = v;
    }
    if let Some(v) = payload.average_current_revenue {
        args.average_current_revenue = v;
    }
    if let Some(v) = payload.historical_expense_ceiling {
        args.historical_expense_ceiling = v;
    }
    if let Some(v) = payload.planned_hiring_cost {
        args.planned_hiring_cost = v;
    }
    if let Some(v) = payload.overhead_rate {
        args.overhead_rate = v;
    }
    if let Some(v) = payload.population {
        args.population = Some(v);
    }
    if let Some(v) = payload.entity_type {
        args.entity_type = Some(v.into());
    }

    build_simulate_request(&args)
}

#[cfg(test)]
fn simulate_request_from_json(json: &str) -> Result<SimulateRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    simulate_request_from_payload(payload)
}

fn simulate(request: &SimulateRequest) -> SimulateResponse {
    SimulateResponse {
        threshold_percent: threshold_percent(request.population, request.entity_type),
        result: run_simulator(&request.inputs, request.population, request.entity_type),
    }
}

fn load_input(path: &Path) -> crate::Result<FundInput> {
    let raw = fs::read_to_string(path).map_err(|e| FundError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| FundError::json(path.display().to_string(), e))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| format!("Failed to encode output: {e}"))?;
    println!("{text}");
    Ok(())
}

/// Dispatches a parsed command line. Errors come back as user-facing text.
pub async fn run_cli(cli: Cli) -> Result<(), String> {
    let reference_path = cli.reference.as_deref();
    match cli.command {
        Command::Serve { port } => {
            let reference = match ReferenceData::load_or_bundled(reference_path) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    log::error!("{e}; calculation endpoints will answer 503");
                    None
                }
            };
            run_http_server(port, reference)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Calculate {
            input,
            pretty,
            derived,
        } => {
            let reference =
                ReferenceData::load_or_bundled(reference_path).map_err(|e| e.to_string())?;
            let input = load_input(&input).map_err(|e| e.to_string())?;
            let report = calculate(Some(&reference), &input).map_err(|e| e.to_string())?;
            let derived_input = derived.then(|| with_derived_fields(&input, &report.simulator));
            print_json(
                &CalculateResponse {
                    report,
                    derived_input,
                },
                pretty,
            )
        }
        Command::Simulate(args) => {
            let request = build_simulate_request(&args)?;
            print_json(&simulate(&request), args.pretty)
        }
        Command::StaffCosts {
            input,
            pretty,
            write_back,
        } => {
            let reference =
                ReferenceData::load_or_bundled(reference_path).map_err(|e| e.to_string())?;
            let input = load_input(&input).map_err(|e| e.to_string())?;
            let absorbed = absorbed_stable_uses(
                &reference,
                input.annual.reference_year,
                &input.staff_in_service,
            )
            .map_err(|e| e.to_string())?;
            let distribution =
                write_back.then(|| with_absorbed_stable_uses(&input.distribution, &absorbed));
            print_json(
                &StaffCostsResponse {
                    absorbed,
                    distribution,
                },
                pretty,
            )
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/calculate", post(calculate_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/staff-costs", post(staff_costs_handler))
        .route("/api/reference", get(reference_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

fn startup_banner(addr: SocketAddr) -> String {
    format!(
        "Fund API listening on http://{addr}\nLocal access: http://127.0.0.1:{}/api/reference",
        addr.port()
    )
}

pub async fn run_http_server(port: u16, reference: Option<ReferenceData>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState {
        reference: reference.map(Arc::new),
    };
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    println!("{}", startup_banner(addr));

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(
    State(state): State<AppState>,
    Query(options): Query<CalculateOptions>,
    Json(input): Json<FundInput>,
) -> Response {
    let reference = match state.reference() {
        Ok(reference) => reference,
        Err(response) => return response,
    };
    match calculate(Some(reference), &input) {
        Ok(report) => {
            let derived_input = options
                .derived
                .then(|| with_derived_fields(&input, &report.simulator));
            json_response(
                StatusCode::OK,
                CalculateResponse {
                    report,
                    derived_input,
                },
            )
        }
        Err(e) => fund_error_response(&e),
    }
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    match simulate_request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, simulate(&request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn staff_costs_handler(
    State(state): State<AppState>,
    Json(payload): Json<StaffCostsPayload>,
) -> Response {
    let reference = match state.reference() {
        Ok(reference) => reference,
        Err(response) => return response,
    };
    match absorbed_stable_uses(reference, payload.reference_year, &payload.staff) {
        Ok(absorbed) => {
            let distribution = payload
                .distribution
                .map(|d| with_absorbed_stable_uses(&d, &absorbed));
            json_response(
                StatusCode::OK,
                StaffCostsResponse {
                    absorbed,
                    distribution,
                },
            )
        }
        Err(e) => fund_error_response(&e),
    }
}

async fn reference_handler(State(state): State<AppState>) -> Response {
    match state.reference() {
        Ok(reference) => json_response(StatusCode::OK, reference),
        Err(response) => response,
    }
}

fn status_for(error: &FundError) -> StatusCode {
    match error {
        FundError::ReferenceDataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        FundError::InvalidInput(_) | FundError::Json { .. } => StatusCode::BAD_REQUEST,
        FundError::InvalidReferenceData(_) | FundError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn fund_error_response(error: &FundError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        log::warn!("Request failed: {error}");
    }
    error_response(status, &error.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
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
mod tests {
    use super::*;
    use crate::core::QualificationArea;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_args() -> SimulateArgs {
        SimulateArgs {
            tabular_salaries_2023: 1_000_000.0,
            current_stable_fund: 300_000.0,
            personnel_expense_2023: 1_000_000.0,
            average_current_revenue: 6_000_000.0,
            historical_expense_ceiling: 1_500_000.0,
            overhead_rate: 27.4,
            population: Some(5_000),
            entity_type: Some(CliEntityType::Municipality),
            ..default_simulate_args_for_api()
        }
    }

    fn bundled_state() -> AppState {
        AppState {
            reference: Some(Arc::new(
                ReferenceData::bundled().expect("bundled table is valid"),
            )),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn build_simulate_request_rejects_negative_amounts() {
        let mut args = sample_args();
        args.planned_hiring_cost = -1.0;
        let err = build_simulate_request(&args).expect_err("must reject negative cost");
        assert!(err.contains("--planned-hiring-cost"));
    }

    #[test]
    fn unknown_entity_class_has_no_threshold() {
        let mut args = sample_args();
        args.entity_type = None;
        let response = simulate(&build_simulate_request(&args).expect("valid"));
        assert_approx(response.threshold_percent, 0.0);
        assert_approx(response.result.phase4_usable_gross, 0.0);
    }

    #[test]
    fn overhead_above_one_hundred_is_a_clamp_not_an_error() {
        let mut args = sample_args();
        args.overhead_rate = 120.0;
        let request = build_simulate_request(&args).expect("clamped, not rejected");
        assert_approx(simulate(&request).result.phase5_net_increment, 0.0);
    }

    #[test]
    fn simulate_request_from_json_parses_web_keys() {
        let json = r#"{
          "tabularSalaries2023": 1000000,
          "currentStableFund": 300000,
          "personnelExpense2023": 1000000,
          "averageCurrentRevenue": 6000000,
          "historicalExpenseCeiling": 1500000,
          "overheadRate": 27.4,
          "population": 5000,
          "entityType": "comune"
        }"#;
        let request = simulate_request_from_json(json).expect("valid payload");
        assert_eq!(request.entity_type, Some(EntityType::Municipality));
        assert_eq!(request.inputs.current_high_qualification_resources, Some(0.0));

        let response = simulate(&request);
        assert_approx(response.threshold_percent, 26.90);
        assert_approx(response.result.phase4_usable_gross, 180_000.0);
        assert!((response.result.phase5_net_increment - 141_287.28).abs() < 0.01);
    }

    #[test]
    fn simulate_request_from_json_reports_bad_json() {
        let err = simulate_request_from_json("{").expect_err("truncated payload");
        assert!(err.starts_with("Invalid API JSON payload"));
    }

    #[test]
    fn fund_errors_map_to_statuses() {
        assert_eq!(
            status_for(&FundError::ReferenceDataUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&FundError::invalid_input("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&FundError::invalid_reference("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn calculate_without_reference_is_unavailable() {
        let response = calculate_handler(
            State(AppState::default()),
            Query(CalculateOptions::default()),
            Json(FundInput::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("message").contains("Reference data"));
    }

    #[tokio::test]
    async fn calculate_returns_report_and_derived_snapshot() {
        let mut input = FundInput::default();
        input.historical.non_executive_fund_2016 = Some(100_000.0);
        input.non_executive.single_amount_2017 = Some(80_000.0);
        input.high_qualification.transfer_from_staff_fund = Some(2_000.0);

        let response = calculate_handler(
            State(bundled_state()),
            Query(CalculateOptions { derived: true }),
            Json(input),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["calculatedFund"]["total"], serde_json::json!(80_000.0));
        assert_eq!(body["complianceChecks"][0]["id"], "ceiling_2016");
        assert_eq!(
            body["derivedInput"]["nonExecutive"]["highQualificationTransfer"],
            serde_json::json!(2_000.0)
        );
    }

    #[tokio::test]
    async fn staff_costs_writes_back_distribution() {
        let payload = StaffCostsPayload {
            reference_year: 2025,
            staff: vec![StaffMember {
                full_year_service: true,
                progression_level: Some("C2".to_string()),
                area: Some(QualificationArea::Istruttore),
                ..StaffMember::default()
            }],
            distribution: Some(ResourceDistribution::default()),
        };
        let response = staff_costs_handler(State(bundled_state()), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["absorbed"]["progression"], serde_json::json!(762.0));
        assert_eq!(
            body["distribution"]["historicalProgressions"],
            serde_json::json!(762.0)
        );
    }

    #[tokio::test]
    async fn reference_endpoint_serves_the_table() {
        let response = reference_handler(State(bundled_state())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["rates"]["pnrr_increment"], serde_json::json!(0.05));

        let response = reference_handler(State(AppState::default())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn startup_banner_names_bind_and_local_addresses() {
        let banner = startup_banner(SocketAddr::from(([0, 0, 0, 0], 9090)));
        let lines: Vec<_> = banner.lines().collect();
        assert_eq!(
            lines,
            [
                "Fund API listening on http://0.0.0.0:9090",
                "Local access: http://127.0.0.1:9090/api/reference",
            ]
        );
    }

    #[test]
    fn cli_parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from([
            "fondo-accessorio",
            "simulate",
            "--tabular-salaries-2023",
            "1000000",
            "--entity-type",
            "municipality",
            "--population",
            "5000",
            "--verbose",
        ])
        .expect("valid command line");
        assert!(cli.verbose);
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.entity_type, Some(CliEntityType::Municipality));
                assert_approx(args.tabular_salaries_2023, 1_000_000.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

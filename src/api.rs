use crate::data_structures::{
    AppState, ComputeRequest, ComputeResponse, ErrorBody, GridQuery, ResolveQuery,
    ResolveResponse, SharedAnalyzer, SharedSettings, ValuationQuery,
};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rdcf::api::SensitivityReport;
use rdcf::error::{RdcfError, ValuationError};
use rdcf::models::{ValuationParams, ValuationReport};
use tracing::{debug, info, instrument, warn};

/// Pipeline failure rendered as `{error, message}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub RdcfError);

impl From<RdcfError> for ApiError {
    fn from(err: RdcfError) -> Self {
        ApiError(err)
    }
}

impl From<ValuationError> for ApiError {
    fn from(err: ValuationError) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RdcfError::Valuation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RdcfError::NoCloseMatch { .. } => StatusCode::NOT_FOUND,
            RdcfError::Fetch(_) => StatusCode::BAD_GATEWAY,
            RdcfError::Directory(_) | RdcfError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), kind = self.0.kind(), error = %self.0, "Request failed");
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Routes served without rate limiting
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/companies/resolve", get(resolve_handler))
}

/// Routes that run the engine; the caller decides how they are limited
pub fn valuation_routes() -> Router<AppState> {
    Router::new()
        .route("/valuation", get(valuation_handler))
        .route("/valuation/compute", post(compute_handler))
        .route("/valuation/grid", get(grid_handler))
}

#[instrument]
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[instrument(skip(analyzer), fields(query = %params.q))]
pub async fn resolve_handler(
    State(analyzer): State<SharedAnalyzer>,
    Query(params): Query<ResolveQuery>,
) -> Result<(StatusCode, Json<ResolveResponse>), ApiError> {
    debug!("Received company resolution request");

    let resolved = analyzer.resolve(&params.q)?;
    info!(name = %resolved.company.name, score = resolved.score, "Resolved company");

    Ok((
        StatusCode::OK,
        Json(ResolveResponse {
            query: params.q,
            name: resolved.company.name,
            identifier: resolved.company.identifier,
            score: resolved.score,
        }),
    ))
}

#[instrument(skip(analyzer, settings, payload), fields(periods = payload.series.len(), years = payload.years))]
pub async fn compute_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(settings): State<SharedSettings>,
    Json(payload): Json<ComputeRequest>,
) -> Result<(StatusCode, Json<ComputeResponse>), ApiError> {
    debug!("Received series valuation request");

    let params = ValuationParams::new(payload.discount_rate, payload.terminal_rate, payload.years);
    let breakdown = analyzer.compute_series(&payload.series, params)?;
    let unit = payload.unit.as_deref().unwrap_or(&settings.units.cash_flow);

    let response = ComputeResponse::new(breakdown, unit);
    info!(value = response.value, "Computed intrinsic value");
    Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(analyzer, settings), fields(company = %query.company, mode = %query.mode))]
pub async fn valuation_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(settings): State<SharedSettings>,
    Query(query): Query<ValuationQuery>,
) -> Result<(StatusCode, Json<ValuationReport>), ApiError> {
    debug!("Received company valuation request");

    let defaults = settings.defaults;
    let params = ValuationParams::new(
        query.discount_rate.unwrap_or(defaults.discount_rate),
        query.terminal_rate.unwrap_or(defaults.terminal_rate),
        query.years.unwrap_or(defaults.years),
    );

    let report = analyzer.value_query(&query.company, query.mode, params).await?;
    info!(identifier = %report.company.identifier, value = report.value, "Returning valuation report");
    Ok((StatusCode::OK, Json(report)))
}

#[instrument(skip(analyzer, settings), fields(company = %query.company, mode = %query.mode))]
pub async fn grid_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(settings): State<SharedSettings>,
    Query(query): Query<GridQuery>,
) -> Result<(StatusCode, Json<SensitivityReport>), ApiError> {
    debug!("Received sensitivity grid request");

    let years = query.years.unwrap_or(settings.defaults.years);
    let resolved = analyzer.resolve(&query.company)?;
    let report = analyzer.sensitivity(&resolved.company, query.mode, years).await?;

    info!(
        identifier = %report.company.identifier,
        cells = report.grid.valid_cells().count(),
        "Returning sensitivity grid"
    );
    Ok((StatusCode::OK, Json(report)))
}

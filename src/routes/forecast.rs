use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{ForecastReport, PriceSeries, RawPriceRow, MAX_HORIZON, WINDOW_LEN};
use crate::services::csv_import_service::{self, ColumnSelection};
use crate::services::forecast_cache::ForecastKey;
use crate::services::{forecasting_service, validation_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_forecast))
        .route("/csv", post(create_forecast_from_csv))
        .route("/status", get(get_status))
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub series: Vec<RawPriceRow>,
    pub horizon: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CsvForecastQuery {
    pub date_column: Option<String>,
    pub value_column: Option<String>,
    pub horizon: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ForecastStatus {
    pub model_loaded: bool,
    pub window_len: usize,
    pub max_horizon: usize,
    pub default_horizon: usize,
    pub scaler_min: f64,
    pub scaler_max: f64,
    pub cached_forecasts: usize,
}

pub async fn create_forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastReport>, AppError> {
    let Json(request) = payload?;
    let horizon = request.horizon.unwrap_or(state.config.default_horizon);
    info!(
        "POST /api/forecast - {} rows, {} days ahead",
        request.series.len(),
        horizon
    );

    let series = validation_service::validate_for_forecast(request.series)?;
    forecast_series(&state, series, horizon).map(Json)
}

pub async fn create_forecast_from_csv(
    State(state): State<AppState>,
    Query(params): Query<CsvForecastQuery>,
    body: String,
) -> Result<Json<ForecastReport>, AppError> {
    let horizon = params.horizon.unwrap_or(state.config.default_horizon);
    info!(
        "POST /api/forecast/csv - {} bytes, {} days ahead",
        body.len(),
        horizon
    );

    let table = csv_import_service::parse_table(&body)?;
    let selection = ColumnSelection {
        date_column: params.date_column,
        value_column: params.value_column,
    };
    let rows = table.price_rows(&selection)?;
    let series = validation_service::validate_for_forecast(rows)?;

    forecast_series(&state, series, horizon).map(Json)
}

pub async fn get_status(State(state): State<AppState>) -> Json<ForecastStatus> {
    info!("GET /api/forecast/status - Forecast service status");
    Json(ForecastStatus {
        model_loaded: state.model.is_some(),
        window_len: WINDOW_LEN,
        max_horizon: MAX_HORIZON,
        default_horizon: state.config.default_horizon,
        scaler_min: state.scaler.min(),
        scaler_max: state.scaler.max(),
        cached_forecasts: state.forecast_cache.len(),
    })
}

fn forecast_series(
    state: &AppState,
    series: PriceSeries,
    horizon: usize,
) -> Result<ForecastReport, AppError> {
    let model = state.model.as_ref().ok_or_else(|| {
        error!("Forecast requested but no model is loaded");
        AppError::ModelUnavailable
    })?;

    let today = Utc::now().date_naive();
    let key = ForecastKey {
        fingerprint: series.fingerprint(),
        horizon,
        today,
    };
    if let Some(report) = state.forecast_cache.get(&key) {
        info!("Serving cached forecast {}", report.run_id);
        return Ok(report);
    }

    let report = forecasting_service::run_forecast(
        &series,
        &state.scaler,
        model.as_ref(),
        horizon,
        today,
    )
    .map_err(|e| {
        error!("Forecast failed: {}", e);
        AppError::from(e)
    })?;

    // Truncated runs are not cached so a transient model failure is retried
    if report.horizon_completed == report.horizon_requested {
        state.forecast_cache.insert(key, report.clone());
    }
    info!(
        "Forecast {} complete: {} daily, {} yearly values",
        report.run_id,
        report.daily.len(),
        report.yearly.len()
    );
    Ok(report)
}

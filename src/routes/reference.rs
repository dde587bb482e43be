use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{PricePoint, ReferenceSummary};
use crate::services::csv_import_service::CsvTable;
use crate::services::statistics_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_reference_summary))
        .route("/series", get(get_reference_series))
}

#[derive(Debug, Deserialize)]
pub struct ReferenceSeriesQuery {
    pub column: Option<String>,
}

fn reference_table(state: &AppState) -> Result<&CsvTable, AppError> {
    state.reference.as_deref().ok_or_else(|| {
        warn!("Reference data requested but none is loaded");
        AppError::NotFound("no reference dataset loaded".to_string())
    })
}

pub async fn get_reference_summary(
    State(state): State<AppState>,
) -> Result<Json<ReferenceSummary>, AppError> {
    info!("GET /api/reference/summary - Reference dataset overview");

    let table = reference_table(&state)?;
    Ok(Json(statistics_service::summarize_reference(
        table,
        &state.config.reference_price_column,
    )))
}

pub async fn get_reference_series(
    State(state): State<AppState>,
    Query(params): Query<ReferenceSeriesQuery>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    let column = params
        .column
        .unwrap_or_else(|| state.config.reference_price_column.clone());
    info!("GET /api/reference/series - Historical prices of '{}'", column);

    let series = reference_table(&state)?.price_series(&column)?;
    Ok(Json(series.points().to_vec()))
}

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{RawPriceRow, SeriesSummary};
use crate::services::{statistics_service, validation_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", post(summarize_series))
}

#[derive(Debug, Deserialize)]
pub struct SeriesRequest {
    pub series: Vec<RawPriceRow>,
}

pub async fn summarize_series(
    payload: Result<Json<SeriesRequest>, JsonRejection>,
) -> Result<Json<SeriesSummary>, AppError> {
    let Json(request) = payload?;
    info!("POST /api/series/summary - {} rows", request.series.len());

    let series = validation_service::validate_rows(request.series)?;
    statistics_service::describe(&series.values())
        .map(Json)
        .ok_or_else(|| AppError::Validation("series is empty".to_string()))
}

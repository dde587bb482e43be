use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, ForecastError};
use crate::models::{SimulationMode, SimulationResult};
use crate::services::simulation_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_simulation))
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub initial_price: f64,
    pub days: usize,
    #[serde(default)]
    pub mode: SimulationMode,
    /// Fixes the random sequence so a path can be reproduced
    pub seed: Option<u64>,
}

pub async fn create_simulation(
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<Json<SimulationResult>, AppError> {
    let Json(request) = payload?;
    info!(
        "POST /api/simulation - {} day(s) from {} ({:?})",
        request.days, request.initial_price, request.mode
    );

    run_simulation(&request).map(Json).map_err(AppError::from)
}

fn run_simulation(request: &SimulationRequest) -> Result<SimulationResult, ForecastError> {
    let (price, days, mode) = (request.initial_price, request.days, request.mode);
    match request.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            simulation_service::simulate(&mut rng, price, days, mode)
        }
        None => simulation_service::simulate(&mut rand::rng(), price, days, mode),
    }
}

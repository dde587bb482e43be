use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::routes::{forecast, health, reference, series, simulation};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allow_origin.as_deref());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/forecast", forecast::router())
        .nest("/api/series", series::router())
        .nest("/api/reference", reference::router())
        .nest("/api/simulation", simulation::router())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("Invalid CORS_ALLOW_ORIGIN; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use gold_forecast_backend::app;
use gold_forecast_backend::config::AppConfig;
use gold_forecast_backend::external::lstm_model::LstmModel;
use gold_forecast_backend::external::sequence_model::SequenceModel;
use gold_forecast_backend::logging::{self, LoggingConfig};
use gold_forecast_backend::models::WINDOW_LEN;
use gold_forecast_backend::services::csv_import_service::{self, CsvTable};
use gold_forecast_backend::services::forecast_cache::ForecastCache;
use gold_forecast_backend::services::scaler_service;
use gold_forecast_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let reference = load_reference(&config);
    let scaler = scaler_service::load_or_fit(
        &config.scaler_path,
        reference.as_deref(),
        config.reference_value_column.as_deref(),
    );
    let model = load_model(&config);

    let cache_ttl = chrono::Duration::seconds(config.forecast_cache_ttl_secs);
    let forecast_cache = ForecastCache::new(cache_ttl);
    spawn_cache_cleanup(forecast_cache.clone(), config.forecast_cache_ttl_secs);

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        scaler: Arc::new(scaler),
        model,
        forecast_cache,
        reference,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("🚀 Gold forecast backend running at http://{}/", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_reference(config: &AppConfig) -> Option<Arc<CsvTable>> {
    if !config.reference_data_path.exists() {
        tracing::warn!(
            "Reference data {:?} not found; reference summary disabled",
            config.reference_data_path
        );
        return None;
    }
    match csv_import_service::load_table(&config.reference_data_path) {
        Ok(table) => Some(Arc::new(table)),
        Err(e) => {
            tracing::warn!("{:#}", e);
            None
        }
    }
}

fn load_model(config: &AppConfig) -> Option<Arc<dyn SequenceModel>> {
    match LstmModel::from_file(&config.model_path) {
        Ok(model) if model.window_len() == WINDOW_LEN => {
            Some(Arc::new(model) as Arc<dyn SequenceModel>)
        }
        Ok(model) => {
            tracing::error!(
                "Model window length {} does not match the required {}; forecasting disabled",
                model.window_len(),
                WINDOW_LEN
            );
            None
        }
        Err(e) => {
            tracing::error!("Error loading model: {:#}; forecasting disabled", e);
            None
        }
    }
}

fn spawn_cache_cleanup(cache: ForecastCache, ttl_secs: i64) {
    let period = std::time::Duration::from_secs(ttl_secs.max(60) as u64);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            cache.cleanup_expired();
        }
    });
}

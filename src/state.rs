use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::sequence_model::SequenceModel;
use crate::models::MinMaxScaler;
use crate::services::csv_import_service::CsvTable;
use crate::services::forecast_cache::ForecastCache;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scaler: Arc<MinMaxScaler>,
    /// `None` when the model failed to load; forecast routes answer 503.
    pub model: Option<Arc<dyn SequenceModel>>,
    pub forecast_cache: ForecastCache,
    pub reference: Option<Arc<CsvTable>>,
}

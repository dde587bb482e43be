pub mod csv_import_service;
pub mod forecast_cache;
pub mod forecasting_service;
pub mod preprocessing_service;
pub mod report_service;
pub mod scaler_service;
pub mod simulation_service;
pub mod statistics_service;
pub mod validation_service;

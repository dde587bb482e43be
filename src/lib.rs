//! Gold price forecasting backend.
//!
//! Loads a pretrained sequence model and a min-max scaler, validates
//! user-submitted price series, and serves daily and five-year forecasts as
//! JSON for a dashboard front end.

pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
mod routes;
pub mod services;
pub mod state;

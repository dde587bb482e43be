use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ForecastError;

/// Number of most recent observations the sequence model consumes.
pub const WINDOW_LEN: usize = 60;
/// Longest daily horizon a single request may ask for.
pub const MAX_HORIZON: usize = 90;
/// Number of yearly projections produced per forecast.
pub const PROJECTION_YEARS: usize = 5;

/// Fixed-length snapshot of normalized observations that seeds one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWindow {
    values: Vec<f64>,
}

impl NormalizedWindow {
    pub fn new(values: Vec<f64>) -> Result<Self, ForecastError> {
        if values.len() != WINDOW_LEN {
            return Err(ForecastError::InvalidInput(format!(
                "window must hold exactly {} values, got {}",
                WINDOW_LEN,
                values.len()
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Single point in a daily forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Result of the iterative forecaster. `failure` is set when the model failed
/// part-way; `points` then holds every step computed before the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub points: Vec<DailyForecastPoint>,
    pub failure: Option<ForecastError>,
}

impl DailyForecast {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.failure.is_some()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyForecastPoint {
    pub year: i32,
    pub value: f64,
}

/// Five-year projection. `fallback` is set when the daily trend was too short
/// to derive a growth rate and the projection is flat.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyForecast {
    pub points: Vec<YearlyForecastPoint>,
    pub yearly_rate: f64,
    pub fallback: Option<ForecastError>,
}

impl YearlyForecast {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Row of the daily forecast table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecastRow {
    pub date: NaiveDate,
    pub predicted_value: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Row of the yearly forecast table. The first year is the base and has no
/// percentage change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyForecastRow {
    pub year: i32,
    pub predicted_value: f64,
    pub change: f64,
    pub change_pct: Option<f64>,
}

/// Headline numbers shown above the forecast tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub first_value: f64,
    pub last_value: f64,
    pub total_change: f64,
    pub total_change_pct: f64,
    pub year_one: f64,
    pub year_three: f64,
    pub year_five: f64,
}

/// Complete forecast handed to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub run_id: Uuid,
    pub horizon_requested: usize,
    pub horizon_completed: usize,
    pub last_observed_value: f64,
    pub daily: Vec<DailyForecastRow>,
    pub yearly: Vec<YearlyForecastRow>,
    pub metrics: ForecastMetrics,
    pub annual_growth_rate: f64,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_requires_exact_length() {
        assert!(NormalizedWindow::new(vec![0.5; WINDOW_LEN]).is_ok());
        assert!(NormalizedWindow::new(vec![0.5; WINDOW_LEN - 1]).is_err());
        assert!(NormalizedWindow::new(vec![0.5; WINDOW_LEN + 1]).is_err());
    }
}

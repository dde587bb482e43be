use std::collections::VecDeque;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{error, info, warn};

use crate::errors::ForecastError;
use crate::external::sequence_model::SequenceModel;
use crate::models::{
    DailyForecast, DailyForecastPoint, ForecastReport, MinMaxScaler, NormalizedWindow,
    PriceSeries, YearlyForecast, YearlyForecastPoint, MAX_HORIZON, PROJECTION_YEARS, WINDOW_LEN,
};
use crate::services::preprocessing_service::{build_window, count_out_of_range};
use crate::services::report_service;

/// Ceiling on the average daily change fed into annualization (0.5% per day)
pub const MAX_DAILY_CHANGE: f64 = 0.005;
/// Ceiling on the annual growth rate (20% per year)
pub const MAX_YEARLY_RATE: f64 = 0.20;
pub const TRADING_DAYS_PER_YEAR: i32 = 252;

/// Run a complete forecast: window, daily steps, yearly projection, report.
///
/// `today` anchors the forecast dates (day 1 is `today + 1`) and its year
/// anchors the yearly projection.
pub fn run_forecast(
    series: &PriceSeries,
    scaler: &MinMaxScaler,
    model: &dyn SequenceModel,
    horizon: usize,
    today: NaiveDate,
) -> Result<ForecastReport, ForecastError> {
    info!(
        "Generating forecast from {} observations ({} days ahead)",
        series.len(),
        horizon
    );
    validate_horizon(horizon)?;

    let window = build_window(series, scaler)?;
    let out_of_range = count_out_of_range(series, scaler);
    if out_of_range > 0 {
        warn!(
            "{} of the last {} observations fall outside the scaler range [{}, {}]",
            out_of_range,
            WINDOW_LEN,
            scaler.min(),
            scaler.max()
        );
    }

    let daily = forecast_daily(&window, scaler, model, today, horizon)?;
    if daily.is_empty() {
        return Err(daily.failure.unwrap_or_else(|| {
            ForecastError::InvalidInput("forecast produced no values".to_string())
        }));
    }

    let last_observed = series
        .last()
        .map(|p| p.value)
        .ok_or_else(|| ForecastError::InvalidInput("price series is empty".to_string()))?;

    let yearly = project_yearly(&daily.values(), last_observed, today.year());
    let mut report = report_service::build_report(&daily, &yearly, horizon, last_observed)?;

    if out_of_range > 0 {
        report.warnings.push(format!(
            "{} recent observation(s) lie outside the scaler range [{:.2}, {:.2}]; \
             predictions may be unreliable",
            out_of_range,
            scaler.min(),
            scaler.max()
        ));
    }

    Ok(report)
}

pub fn validate_horizon(horizon: usize) -> Result<(), ForecastError> {
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(ForecastError::InvalidInput(format!(
            "horizon must be between 1 and {} days, got {}",
            MAX_HORIZON, horizon
        )));
    }
    Ok(())
}

/// Iterative multi-step forecast.
///
/// Each step feeds the sliding window to the model, de-normalizes the
/// prediction, and pushes its re-normalized value back into the window. A
/// model failure stops the loop; the steps completed so far are returned with
/// the failure attached. The only `Err` is an out-of-range horizon.
pub fn forecast_daily(
    window: &NormalizedWindow,
    scaler: &MinMaxScaler,
    model: &dyn SequenceModel,
    today: NaiveDate,
    horizon: usize,
) -> Result<DailyForecast, ForecastError> {
    validate_horizon(horizon)?;

    let mut current: VecDeque<f64> = window.values().iter().copied().collect();
    let mut points = Vec::with_capacity(horizon);

    for step in 1..=horizon {
        let normalized = match model.predict_next(current.make_contiguous()) {
            Ok(value) => value,
            Err(e) => {
                let failure = ForecastError::ModelInvocation {
                    step,
                    reason: e.to_string(),
                };
                if points.is_empty() {
                    error!("Prediction failed on the first step: {}", e);
                } else {
                    warn!(
                        "Prediction failed on day {}: {}; keeping {} completed day(s)",
                        step,
                        e,
                        points.len()
                    );
                }
                return Ok(DailyForecast {
                    points,
                    failure: Some(failure),
                });
            }
        };

        let value = scaler.denormalize(normalized);
        points.push(DailyForecastPoint {
            date: today + Duration::days(step as i64),
            value,
        });

        current.pop_front();
        current.push_back(scaler.normalize(value));
    }

    Ok(DailyForecast {
        points,
        failure: None,
    })
}

/// Clipped annual growth rate implied by a daily forecast, or `None` when
/// there is no usable day-over-day change.
pub fn annual_growth_rate(daily_values: &[f64]) -> Option<f64> {
    let changes: Vec<f64> = daily_values
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|change| change.is_finite())
        .collect();

    if changes.is_empty() {
        return None;
    }

    let avg_daily_change = changes.iter().sum::<f64>() / changes.len() as f64;
    let avg_daily_change = avg_daily_change.clamp(-MAX_DAILY_CHANGE, MAX_DAILY_CHANGE);

    let yearly_rate = (1.0 + avg_daily_change).powi(TRADING_DAYS_PER_YEAR) - 1.0;
    Some(yearly_rate.clamp(-MAX_YEARLY_RATE, MAX_YEARLY_RATE))
}

/// Five-year projection from the daily trend.
///
/// Starts at the last daily value (or `start_value` when there are no daily
/// values) and compounds the clipped annual rate with harmonic decay: year
/// `k + 2` is year `k + 1` times `1 + rate / (k + 1)`. Fewer than two daily
/// values give a flat projection with `fallback` set.
pub fn project_yearly(
    daily_values: &[f64],
    start_value: f64,
    current_year: i32,
) -> YearlyForecast {
    let base = daily_values.last().copied().unwrap_or(start_value);

    let rate = if daily_values.len() >= 2 {
        annual_growth_rate(daily_values)
    } else {
        None
    };

    match rate {
        Some(yearly_rate) => YearlyForecast {
            points: compound_with_decay(base, yearly_rate, current_year),
            yearly_rate,
            fallback: None,
        },
        None => {
            warn!(
                "Cannot derive a trend from {} daily value(s); projecting flat at {:.2}",
                daily_values.len(),
                base
            );
            YearlyForecast {
                points: compound_with_decay(base, 0.0, current_year),
                yearly_rate: 0.0,
                fallback: Some(ForecastError::DegenerateTrend {
                    points: daily_values.len(),
                }),
            }
        }
    }
}

fn compound_with_decay(
    base: f64,
    yearly_rate: f64,
    current_year: i32,
) -> Vec<YearlyForecastPoint> {
    let mut current_value = base;
    let mut points = Vec::with_capacity(PROJECTION_YEARS);

    for k in 0..PROJECTION_YEARS {
        points.push(YearlyForecastPoint {
            year: current_year + k as i32 + 1,
            value: current_value,
        });
        current_value *= 1.0 + yearly_rate / (k + 1) as f64;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::sequence_model::ModelError;
    use crate::models::PricePoint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ConstantModel(f64);

    impl SequenceModel for ConstantModel {
        fn predict_next(&self, _window: &[f64]) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    /// Succeeds for `ok_steps` calls, then fails.
    struct FailingModel {
        ok_steps: usize,
        calls: AtomicUsize,
    }

    impl FailingModel {
        fn after(ok_steps: usize) -> Self {
            Self {
                ok_steps,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SequenceModel for FailingModel {
        fn predict_next(&self, _window: &[f64]) -> Result<f64, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.ok_steps {
                Ok(0.5)
            } else {
                Err(ModelError::Inference("interpreter crashed".to_string()))
            }
        }
    }

    /// Predicts last + 0.01 and records every window it sees.
    struct RecordingModel {
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl SequenceModel for RecordingModel {
        fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError> {
            self.seen.lock().unwrap().push(window.to_vec());
            Ok(window[window.len() - 1] + 0.01)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ramp_window() -> NormalizedWindow {
        let values = (0..WINDOW_LEN).map(|i| i as f64 / 100.0).collect();
        NormalizedWindow::new(values).unwrap()
    }

    fn scaler() -> MinMaxScaler {
        MinMaxScaler::from_range(1000.0, 2000.0).unwrap()
    }

    #[test]
    fn test_full_horizon_produces_dated_points() {
        let model = ConstantModel(0.5);
        let daily = forecast_daily(&ramp_window(), &scaler(), &model, today(), 7).unwrap();

        assert_eq!(daily.len(), 7);
        assert!(!daily.is_truncated());
        assert_eq!(daily.points[0].date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(daily.points[6].date, NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
        assert!(daily.points.iter().all(|p| (p.value - 1500.0).abs() < 1e-9));
    }

    #[test]
    fn test_failure_mid_run_keeps_completed_steps() {
        let model = FailingModel::after(14);
        let daily = forecast_daily(&ramp_window(), &scaler(), &model, today(), 30).unwrap();

        assert_eq!(daily.len(), 14);
        assert!(matches!(
            daily.failure,
            Some(ForecastError::ModelInvocation { step: 15, .. })
        ));
    }

    #[test]
    fn test_failure_on_first_step_returns_empty_with_failure() {
        let model = FailingModel::after(0);
        let daily = forecast_daily(&ramp_window(), &scaler(), &model, today(), 10).unwrap();

        assert!(daily.is_empty());
        assert!(matches!(
            daily.failure,
            Some(ForecastError::ModelInvocation { step: 1, .. })
        ));
    }

    #[test]
    fn test_horizon_bounds() {
        let model = ConstantModel(0.5);
        for horizon in [0, MAX_HORIZON + 1] {
            let result = forecast_daily(&ramp_window(), &scaler(), &model, today(), horizon);
            assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
        }
        let daily =
            forecast_daily(&ramp_window(), &scaler(), &model, today(), MAX_HORIZON).unwrap();
        assert_eq!(daily.len(), MAX_HORIZON);
    }

    #[test]
    fn test_window_slides_with_each_prediction() {
        let model = RecordingModel {
            seen: Mutex::new(Vec::new()),
        };
        forecast_daily(&ramp_window(), &scaler(), &model, today(), 3).unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|w| w.len() == WINDOW_LEN));

        // Second window drops the oldest value and appends the first prediction
        assert!((seen[1][0] - seen[0][1]).abs() < 1e-12);
        assert!((seen[1][WINDOW_LEN - 1] - 0.60).abs() < 1e-9);
        assert!((seen[2][WINDOW_LEN - 1] - 0.61).abs() < 1e-9);
    }

    #[test]
    fn test_daily_changes_above_cap_clip_to_twenty_percent() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let rate = annual_growth_rate(&values).unwrap();
        assert!((rate - MAX_YEARLY_RATE).abs() < 1e-12);
    }

    #[test]
    fn test_rate_always_within_bounds() {
        let crash: Vec<f64> = (0..10).map(|i| 1000.0 * 0.5_f64.powi(i)).collect();
        let rate = annual_growth_rate(&crash).unwrap();
        assert!((rate + MAX_YEARLY_RATE).abs() < 1e-12);

        let small = [100.0, 100.01, 100.02];
        let rate = annual_growth_rate(&small).unwrap();
        assert!(rate > 0.0 && rate < MAX_YEARLY_RATE);
    }

    #[test]
    fn test_yearly_harmonic_decay() {
        let values = [1000.0, 1001.0, 1002.5, 1003.0];
        let rate = annual_growth_rate(&values).unwrap();
        let yearly = project_yearly(&values, 900.0, 2025);

        assert!(yearly.fallback.is_none());
        assert_eq!(yearly.points.len(), PROJECTION_YEARS);
        assert_eq!(yearly.points[0].year, 2026);
        assert_eq!(yearly.points[4].year, 2030);
        assert_eq!(yearly.points[0].value, 1003.0);
        assert_eq!(yearly.points[1].value, 1003.0 * (1.0 + rate / 1.0));
        assert_eq!(yearly.points[2].value, yearly.points[1].value * (1.0 + rate / 2.0));
    }

    #[test]
    fn test_single_point_yields_flat_fallback() {
        let yearly = project_yearly(&[100.0], 95.0, 2025);

        assert_eq!(yearly.values(), vec![100.0; 5]);
        assert_eq!(yearly.fallback, Some(ForecastError::DegenerateTrend { points: 1 }));
        assert_eq!(yearly.yearly_rate, 0.0);
    }

    #[test]
    fn test_empty_daily_projects_from_start_value() {
        let yearly = project_yearly(&[], 95.0, 2025);
        assert_eq!(yearly.values(), vec![95.0; 5]);
        assert!(yearly.fallback.is_some());
    }

    #[test]
    fn test_run_forecast_end_to_end() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..120)
            .map(|i| PricePoint::new(start + Duration::days(i), 1500.0 + i as f64))
            .collect();
        let series = PriceSeries::new(points).unwrap();

        let model = ConstantModel(0.7);
        let report = run_forecast(&series, &scaler(), &model, 30, today()).unwrap();

        assert_eq!(report.horizon_requested, 30);
        assert_eq!(report.horizon_completed, 30);
        assert_eq!(report.daily.len(), 30);
        assert_eq!(report.yearly.len(), 5);
        assert_eq!(report.last_observed_value, 1619.0);
        assert!((report.metrics.first_value - 1700.0).abs() < 1e-9);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_observations_warn_once() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // Last 60 observations are 1960..2019; 2001..2019 exceed the range
        let points = (0..80)
            .map(|i| PricePoint::new(start + Duration::days(i), 1940.0 + i as f64))
            .collect();
        let series = PriceSeries::new(points).unwrap();

        let model = ConstantModel(0.5);
        let report = run_forecast(&series, &scaler(), &model, 5, today()).unwrap();

        let warnings: Vec<&String> = report
            .warnings
            .iter()
            .filter(|w| w.contains("outside the scaler range"))
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("19 recent observation(s)"));
    }

    #[test]
    fn test_run_forecast_fails_when_no_step_succeeds() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..60)
            .map(|i| PricePoint::new(start + Duration::days(i), 1500.0))
            .collect();
        let series = PriceSeries::new(points).unwrap();
        let model = FailingModel::after(0);

        let err = run_forecast(&series, &scaler(), &model, 5, today()).unwrap_err();
        assert!(matches!(err, ForecastError::ModelInvocation { step: 1, .. }));
    }
}

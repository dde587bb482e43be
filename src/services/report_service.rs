use chrono::Utc;
use uuid::Uuid;

use crate::errors::ForecastError;
use crate::models::{
    DailyForecast, DailyForecastRow, ForecastMetrics, ForecastReport, YearlyForecast,
    YearlyForecastRow,
};

/// Tabulate a daily and yearly forecast for the dashboard.
///
/// The daily forecast must hold at least one point.
pub fn build_report(
    daily: &DailyForecast,
    yearly: &YearlyForecast,
    horizon_requested: usize,
    last_observed_value: f64,
) -> Result<ForecastReport, ForecastError> {
    let daily_values = daily.values();
    let yearly_values = yearly.values();

    let (first_value, last_value) = match (daily_values.first(), daily_values.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(ForecastError::InvalidInput(
                "cannot build a report from an empty forecast".to_string(),
            ))
        }
    };

    let daily_rows = daily
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let (change, change_pct) = if i == 0 {
                (0.0, 0.0)
            } else {
                let prev = daily_values[i - 1];
                (point.value - prev, percent_change(prev, point.value))
            };
            DailyForecastRow {
                date: point.date,
                predicted_value: point.value,
                change,
                change_pct,
            }
        })
        .collect();

    let yearly_rows = yearly
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let (change, change_pct) = if i == 0 {
                (0.0, None)
            } else {
                let prev = yearly_values[i - 1];
                (point.value - prev, Some(percent_change(prev, point.value)))
            };
            YearlyForecastRow {
                year: point.year,
                predicted_value: point.value,
                change,
                change_pct,
            }
        })
        .collect();

    let year_at = |index: usize| yearly_values.get(index).copied().unwrap_or(last_value);
    let total_change = last_value - first_value;

    let metrics = ForecastMetrics {
        first_value,
        last_value,
        total_change,
        total_change_pct: percent_change(first_value, last_value),
        year_one: year_at(0),
        year_three: year_at(2),
        year_five: year_at(4),
    };

    let mut warnings = Vec::new();
    if let Some(failure) = &daily.failure {
        warnings.push(format!(
            "Forecast stopped after {} of {} days: {}",
            daily.len(),
            horizon_requested,
            failure
        ));
    }
    if let Some(fallback) = &yearly.fallback {
        warnings.push(format!("Yearly projection is flat: {}", fallback));
    }

    Ok(ForecastReport {
        run_id: Uuid::new_v4(),
        horizon_requested,
        horizon_completed: daily.len(),
        last_observed_value,
        daily: daily_rows,
        yearly: yearly_rows,
        metrics,
        annual_growth_rate: yearly.yearly_rate,
        warnings,
        generated_at: Utc::now(),
    })
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyForecastPoint, YearlyForecastPoint};
    use chrono::NaiveDate;

    fn daily(values: &[f64]) -> DailyForecast {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        DailyForecast {
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| DailyForecastPoint {
                    date: start + chrono::Duration::days(i as i64),
                    value,
                })
                .collect(),
            failure: None,
        }
    }

    fn yearly(values: &[f64]) -> YearlyForecast {
        YearlyForecast {
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| YearlyForecastPoint {
                    year: 2026 + i as i32,
                    value,
                })
                .collect(),
            yearly_rate: 0.1,
            fallback: None,
        }
    }

    #[test]
    fn test_change_columns() {
        let report = build_report(
            &daily(&[100.0, 110.0, 99.0]),
            &yearly(&[99.0, 108.9, 114.345, 118.15, 121.1]),
            3,
            98.0,
        )
        .unwrap();

        assert_eq!(report.daily[0].change, 0.0);
        assert_eq!(report.daily[0].change_pct, 0.0);
        assert!((report.daily[1].change - 10.0).abs() < 1e-9);
        assert!((report.daily[1].change_pct - 10.0).abs() < 1e-9);
        assert!((report.daily[2].change_pct + 10.0).abs() < 1e-9);

        assert_eq!(report.yearly[0].change_pct, None);
        assert!((report.yearly[1].change_pct.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics() {
        let report = build_report(
            &daily(&[200.0, 210.0, 220.0]),
            &yearly(&[220.0, 230.0, 240.0, 250.0, 260.0]),
            3,
            199.0,
        )
        .unwrap();

        assert_eq!(report.metrics.first_value, 200.0);
        assert_eq!(report.metrics.last_value, 220.0);
        assert_eq!(report.metrics.total_change, 20.0);
        assert!((report.metrics.total_change_pct - 10.0).abs() < 1e-9);
        assert_eq!(report.metrics.year_one, 220.0);
        assert_eq!(report.metrics.year_three, 240.0);
        assert_eq!(report.metrics.year_five, 260.0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_truncation_and_fallback_warnings() {
        let mut truncated = daily(&[150.0]);
        truncated.failure = Some(ForecastError::ModelInvocation {
            step: 2,
            reason: "bad tensor".to_string(),
        });
        let mut flat = yearly(&[150.0; 5]);
        flat.fallback = Some(ForecastError::DegenerateTrend { points: 1 });

        let report = build_report(&truncated, &flat, 10, 149.0).unwrap();

        assert_eq!(report.horizon_completed, 1);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("1 of 10 days"));
    }

    #[test]
    fn test_empty_forecast_rejected() {
        let result = build_report(&daily(&[]), &yearly(&[1.0; 5]), 5, 1.0);
        assert!(result.is_err());
    }
}

use tracing::debug;

use crate::errors::ForecastError;
use crate::models::{MinMaxScaler, NormalizedWindow, PriceSeries, WINDOW_LEN};

/// Normalize the most recent `WINDOW_LEN` observations into the window that
/// seeds a forecast run.
pub fn build_window(
    series: &PriceSeries,
    scaler: &MinMaxScaler,
) -> Result<NormalizedWindow, ForecastError> {
    if series.len() < WINDOW_LEN {
        return Err(ForecastError::InsufficientData {
            required: WINDOW_LEN,
            actual: series.len(),
        });
    }

    let tail = series.tail(WINDOW_LEN);
    let values: Vec<f64> = tail.iter().map(|p| scaler.normalize(p.value)).collect();
    debug!("Built normalized window ending at {}", tail[tail.len() - 1].date);

    NormalizedWindow::new(values)
}

/// Number of window observations outside the scaler's fitted range.
pub fn count_out_of_range(series: &PriceSeries, scaler: &MinMaxScaler) -> usize {
    series
        .tail(WINDOW_LEN)
        .iter()
        .filter(|p| !scaler.contains(p.value))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn series_of(len: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points = (0..len)
            .map(|i| PricePoint::new(start + Duration::days(i as i64), 100.0 + i as f64))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let scaler = MinMaxScaler::from_range(0.0, 500.0).unwrap();
        for len in [0, 1, 30, 59] {
            let err = build_window(&series_of(len), &scaler).unwrap_err();
            let expected = ForecastError::InsufficientData {
                required: 60,
                actual: len,
            };
            assert_eq!(err, expected);
        }
    }

    #[test]
    fn test_window_uses_most_recent_observations() {
        let scaler = MinMaxScaler::from_range(100.0, 200.0).unwrap();
        let window = build_window(&series_of(80), &scaler).unwrap();

        assert_eq!(window.values().len(), WINDOW_LEN);
        // Observations 20..80 hold prices 120..179
        assert!((window.values()[0] - 0.20).abs() < 1e-12);
        assert!((window.values()[59] - 0.79).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_count() {
        let scaler = MinMaxScaler::from_range(100.0, 150.0).unwrap();
        // Window holds 100..159, of which 151..159 exceed the range
        assert_eq!(count_out_of_range(&series_of(60), &scaler), 9);
    }
}

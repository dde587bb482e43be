use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ForecastError;

// A single observed price on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A raw cell value as submitted by a client: JSON numbers and numeric
/// strings are both accepted and parsed during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// An unvalidated (date, value) row. Either field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: Option<String>,
    pub value: Option<RawValue>,
}

impl RawPriceRow {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: Some(date.into()),
            value: Some(RawValue::Number(value)),
        }
    }
}

/// Ordered price observations: every value positive and finite, dates
/// strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, ForecastError> {
        for (i, point) in points.iter().enumerate() {
            if !point.value.is_finite() || point.value <= 0.0 {
                return Err(ForecastError::InvalidInput(format!(
                    "value on {} must be a positive number, got {}",
                    point.date, point.value
                )));
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(ForecastError::InvalidInput(format!(
                    "dates must be strictly increasing ({} follows {})",
                    point.date,
                    points[i - 1].date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The most recent `n` observations (all of them if the series is shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Stable identity of the series contents, used as a cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for point in &self.points {
            point.date.hash(&mut hasher);
            point.value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_rejects_non_positive_values() {
        let points = vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(2), 0.0)];
        let result = PriceSeries::new(points);
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
    }

    #[test]
    fn test_series_rejects_repeated_dates() {
        let points = vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(1), 11.0)];
        let result = PriceSeries::new(points);
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
    }

    #[test]
    fn test_tail_returns_most_recent_points() {
        let points = (1..=5).map(|d| PricePoint::new(day(d), d as f64)).collect();
        let series = PriceSeries::new(points).unwrap();
        let tail: Vec<f64> = series.tail(2).iter().map(|p| p.value).collect();
        assert_eq!(tail, vec![4.0, 5.0]);
        assert_eq!(series.tail(10).len(), 5);
    }

    #[test]
    fn test_fingerprint_changes_with_contents() {
        let a = PriceSeries::new(vec![PricePoint::new(day(1), 10.0)]).unwrap();
        let b = PriceSeries::new(vec![PricePoint::new(day(1), 10.5)]).unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}

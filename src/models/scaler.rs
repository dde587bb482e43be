use serde::{Deserialize, Serialize};

use crate::errors::ForecastError;

/// Min-max normalizer over a fitted (min, max) price range.
///
/// Values inside the fitted range map onto [0, 1]. The transform is linear and
/// is not clipped, so prices outside the range map outside [0, 1] and still
/// round-trip through `denormalize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    pub fn from_range(min: f64, max: f64) -> Result<Self, ForecastError> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(ForecastError::InvalidInput(format!(
                "scaler range must satisfy min < max, got ({}, {})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Fits the range over `values`. A constant input is widened to
    /// `[v, v + 1]` so the scale never divides by zero.
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
        if finite.peek().is_none() {
            return Err(ForecastError::InvalidInput(
                "cannot fit scaler on an empty set of values".to_string(),
            ));
        }
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if max > min {
            Self::from_range(min, max)
        } else {
            Self::from_range(min, min + 1.0)
        }
    }

    /// The range used when nothing better is available.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * (self.max - self.min) + self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Persisted scalers are deserialized without going through
    /// `from_range`, so they are re-checked here.
    pub fn validate(&self) -> Result<(), ForecastError> {
        Self::from_range(self.min, self.max).map(|_| ())
    }
}

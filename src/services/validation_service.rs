use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::errors::ForecastError;
use crate::models::{PricePoint, PriceSeries, RawPriceRow, RawValue, WINDOW_LEN};

/// Month-first wins for ambiguous slash dates; day-first is tried when the
/// month would be out of range.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_date(raw: &str) -> Result<NaiveDate, ForecastError> {
    let trimmed = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }

    Err(ForecastError::InvalidInput(format!(
        "'{}' is not a valid date (expected e.g. YYYY-MM-DD, MM/DD/YYYY or DD/MM/YYYY)",
        raw
    )))
}

/// Parse a numeric cell, tolerating currency symbols and thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_value(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Number(v) if v.is_finite() => Some(*v),
        RawValue::Number(_) => None,
        RawValue::Text(text) => parse_number(text),
    }
}

/// Validate raw rows into a price series.
///
/// Rejects missing or malformed cells, non-positive prices and repeated
/// dates. Rows out of date order are sorted.
pub fn validate_rows(rows: Vec<RawPriceRow>) -> Result<PriceSeries, ForecastError> {
    let mut points = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let line = index + 1;
        let raw_date = row
            .date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| ForecastError::InvalidInput(format!("row {}: missing date", line)))?;
        let date = parse_date(raw_date)
            .map_err(|e| ForecastError::InvalidInput(format!("row {}: {}", line, e)))?;

        let value = row
            .value
            .as_ref()
            .ok_or_else(|| ForecastError::InvalidInput(format!("row {}: missing value", line)))
            .and_then(|raw| {
                parse_value(raw).ok_or_else(|| {
                    ForecastError::InvalidInput(format!("row {}: value is not numeric", line))
                })
            })?;

        if value <= 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "row {}: price must be positive, got {}",
                line, value
            )));
        }

        points.push(PricePoint::new(date, value));
    }

    if points.windows(2).any(|pair| pair[0].date > pair[1].date) {
        warn!("Price rows are not in date order; sorting {} rows", points.len());
        points.sort_by_key(|p| p.date);
    }

    if let Some(pair) = points.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(ForecastError::InvalidInput(format!(
            "date {} appears more than once",
            pair[0].date
        )));
    }

    PriceSeries::new(points)
}

/// `validate_rows` plus the minimum length required to seed a forecast.
pub fn validate_for_forecast(rows: Vec<RawPriceRow>) -> Result<PriceSeries, ForecastError> {
    if rows.len() < WINDOW_LEN {
        return Err(ForecastError::InsufficientData {
            required: WINDOW_LEN,
            actual: rows.len(),
        });
    }

    let series = validate_rows(rows)?;
    info!("Validated price series with {} observations", series.len());
    Ok(series)
}

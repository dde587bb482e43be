use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::errors::ForecastError;
use crate::models::MinMaxScaler;
use crate::services::csv_import_service::CsvTable;

pub fn load_scaler(path: &Path) -> Result<MinMaxScaler> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scaler file: {:?}", path))?;
    let scaler: MinMaxScaler = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scaler file: {:?}", path))?;
    scaler
        .validate()
        .with_context(|| format!("Invalid scaler range in {:?}", path))?;
    Ok(scaler)
}

pub fn save_scaler(scaler: &MinMaxScaler, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(scaler).context("Failed to serialize scaler")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write scaler file: {:?}", path))?;
    Ok(())
}

/// Fit over the named reference column, or the first numeric column when no
/// name is given.
pub fn fit_from_reference(
    table: &CsvTable,
    column: Option<&str>,
) -> Result<MinMaxScaler, ForecastError> {
    let (name, values) = match column {
        Some(name) => {
            let index = table.column_index(name).ok_or_else(|| {
                ForecastError::InvalidInput(format!("reference column '{}' not found", name))
            })?;
            let values = table.numeric_column(index).ok_or_else(|| {
                ForecastError::InvalidInput(format!("reference column '{}' is not numeric", name))
            })?;
            (name.to_string(), values)
        }
        None => table.numeric_columns().into_iter().next().ok_or_else(|| {
            ForecastError::InvalidInput("reference data has no numeric column".to_string())
        })?,
    };

    let scaler = MinMaxScaler::fit(&values)?;
    info!(
        "Fitted scaler on reference column '{}' ({} values): [{}, {}]",
        name,
        values.len(),
        scaler.min(),
        scaler.max()
    );
    Ok(scaler)
}

/// Load the persisted scaler, or fit and persist a new one.
///
/// A new scaler is fitted from the reference table when available, otherwise
/// over [0, 1]. Failing to persist it is logged but not fatal.
pub fn load_or_fit(
    scaler_path: &Path,
    reference: Option<&CsvTable>,
    column: Option<&str>,
) -> MinMaxScaler {
    match load_scaler(scaler_path) {
        Ok(scaler) => {
            info!(
                "Loaded scaler from {:?}: [{}, {}]",
                scaler_path,
                scaler.min(),
                scaler.max()
            );
            return scaler;
        }
        Err(e) => warn!("{:#}; creating a new scaler", e),
    }

    let scaler = match reference.map(|table| fit_from_reference(table, column)) {
        Some(Ok(scaler)) => scaler,
        Some(Err(e)) => {
            warn!("Cannot fit scaler on reference data: {}; using [0, 1]", e);
            MinMaxScaler::unit()
        }
        None => {
            warn!("No reference data available; using scaler range [0, 1]");
            MinMaxScaler::unit()
        }
    };

    if let Err(e) = save_scaler(&scaler, scaler_path) {
        warn!("{:#}", e);
    }

    scaler
}

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::info;

use crate::errors::ForecastError;
use crate::models::{PriceSeries, RawPriceRow, RawValue, TablePreview};
use crate::services::validation_service::{self, parse_number};

/// A CSV file read fully into memory, cells kept as text.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Which columns hold the dates and the prices. `None` means auto-detect.
#[derive(Debug, Clone, Default)]
pub struct ColumnSelection {
    pub date_column: Option<String>,
    pub value_column: Option<String>,
}

pub fn parse_table(content: &str) -> Result<CsvTable, ForecastError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ForecastError::InvalidInput(format!("cannot read CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_num, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ForecastError::InvalidInput(format!("malformed CSV at record {}: {}", line_num + 1, e))
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(CsvTable { headers, rows })
}

pub fn load_table(path: &Path) -> Result<CsvTable> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    let table = parse_table(&file_content)
        .with_context(|| format!("Failed to parse CSV file: {:?}", path))?;

    info!(
        "Loaded {:?}: {} rows, columns {:?}",
        path,
        table.rows.len(),
        table.headers
    );
    Ok(table)
}

impl CsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.as_str())
            .filter(|c| !c.is_empty())
    }

    /// Values of a column when every cell parses as a number.
    pub fn numeric_column(&self, column: usize) -> Option<Vec<f64>> {
        if self.rows.is_empty() {
            return None;
        }
        (0..self.rows.len())
            .map(|row| self.cell(row, column).and_then(parse_number))
            .collect()
    }

    /// Every fully numeric column, in header order.
    pub fn numeric_columns(&self) -> Vec<(String, Vec<f64>)> {
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                self.numeric_column(index).map(|values| (name.clone(), values))
            })
            .collect()
    }

    /// The first `n` rows.
    pub fn preview(&self, n: usize) -> TablePreview {
        TablePreview {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    fn default_date_column(&self) -> usize {
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains("date"))
            .unwrap_or(0)
    }

    fn default_value_column(&self, date_column: usize) -> Option<usize> {
        (0..self.headers.len())
            .filter(|&index| index != date_column)
            .find(|&index| self.numeric_column(index).is_some())
    }

    fn resolve(&self, name: &str) -> Result<usize, ForecastError> {
        self.column_index(name).ok_or_else(|| {
            ForecastError::InvalidInput(format!(
                "column '{}' not found (available: {})",
                name,
                self.headers.join(", ")
            ))
        })
    }

    /// Extract (date, value) rows from the selected columns. Cells are
    /// passed through as text; validation happens downstream.
    pub fn price_rows(
        &self,
        selection: &ColumnSelection,
    ) -> Result<Vec<RawPriceRow>, ForecastError> {
        if self.headers.len() < 2 {
            return Err(ForecastError::InvalidInput(
                "CSV must have at least 2 columns (date and price)".to_string(),
            ));
        }

        let date_column = match &selection.date_column {
            Some(name) => self.resolve(name)?,
            None => self.default_date_column(),
        };
        let value_column = match &selection.value_column {
            Some(name) => self.resolve(name)?,
            None => self.default_value_column(date_column).ok_or_else(|| {
                ForecastError::InvalidInput("no numeric price column found".to_string())
            })?,
        };
        if date_column == value_column {
            return Err(ForecastError::InvalidInput(
                "date and price columns must differ".to_string(),
            ));
        }

        info!(
            "Using columns '{}' (date) and '{}' (price)",
            self.headers[date_column], self.headers[value_column]
        );

        Ok((0..self.rows.len())
            .map(|row| RawPriceRow {
                date: self.cell(row, date_column).map(|c| c.to_string()),
                value: self
                    .cell(row, value_column)
                    .map(|c| RawValue::Text(c.to_string())),
            })
            .collect())
    }

    /// Validated (date, price) series of the named column, dates taken from
    /// the default date column.
    pub fn price_series(&self, value_column: &str) -> Result<PriceSeries, ForecastError> {
        let selection = ColumnSelection {
            date_column: None,
            value_column: Some(value_column.to_string()),
        };
        validation_service::validate_rows(self.price_rows(&selection)?)
    }
}

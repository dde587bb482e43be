use tracing::warn;

use crate::models::{
    ColumnSummary, CorrelationMatrix, PriceHighlights, PriceSeries, ReferenceSummary,
    SeriesSummary,
};
use crate::services::csv_import_service::CsvTable;

/// Rows shown in the reference data preview
pub const PREVIEW_ROWS: usize = 5;

/// count / mean / std / min / quartiles / max of a series, with sample
/// standard deviation and linearly interpolated quantiles. `None` when empty.
pub fn describe(values: &[f64]) -> Option<SeriesSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Some(SeriesSummary {
        count: values.len(),
        mean: mean(values),
        std: sample_std_dev(values),
        min: sorted[0],
        p25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        p75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Pearson correlation over the common prefix of `a` and `b`; `None` when
/// either side has no variance.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        covariance += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(covariance / (var_a.sqrt() * var_b.sqrt()))
}

pub fn correlation_matrix(columns: &[(String, Vec<f64>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| correlation(a, b)).collect())
        .collect();

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Highest and lowest price with their dates, and the latest price. Ties keep
/// the earliest date.
pub fn price_highlights(column: &str, series: &PriceSeries) -> Option<PriceHighlights> {
    let points = series.points();
    let latest = *points.last()?;
    let mut highest = points[0];
    let mut lowest = points[0];
    for point in &points[1..] {
        if point.value > highest.value {
            highest = *point;
        }
        if point.value < lowest.value {
            lowest = *point;
        }
    }

    Some(PriceHighlights {
        column: column.to_string(),
        highest,
        lowest,
        latest,
    })
}

/// Summaries and correlations of every numeric column of the reference table,
/// price highlights of `price_column`, and a preview of the first rows.
pub fn summarize_reference(table: &CsvTable, price_column: &str) -> ReferenceSummary {
    let numeric = table.numeric_columns();

    let columns = numeric
        .iter()
        .filter_map(|(name, values)| {
            describe(values).map(|summary| ColumnSummary {
                column: name.clone(),
                summary,
            })
        })
        .collect();

    let highlights = match table.price_series(price_column) {
        Ok(series) => price_highlights(price_column, &series),
        Err(e) => {
            warn!("No price highlights for reference column '{}': {}", price_column, e);
            None
        }
    };

    ReferenceSummary {
        rows: table.rows.len(),
        columns,
        correlation: correlation_matrix(&numeric),
        highlights,
        preview: table.preview(PREVIEW_ROWS),
    }
}

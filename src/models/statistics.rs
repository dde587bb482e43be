use serde::{Deserialize, Serialize};

use crate::models::PricePoint;

/// Descriptive statistics of a numeric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub summary: SeriesSummary,
}

/// Pearson correlations between columns. `None` marks pairs where one side has
/// zero variance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Highest, lowest and most recent price of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHighlights {
    pub column: String,
    pub highest: PricePoint,
    pub lowest: PricePoint,
    pub latest: PricePoint,
}

/// The leading rows of a table, cells as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Overview of the reference price dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub correlation: CorrelationMatrix,
    /// `None` when the price column is missing or does not validate
    pub highlights: Option<PriceHighlights>,
    pub preview: TablePreview,
}

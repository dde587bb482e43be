mod forecast;
mod price_point;
mod scaler;
mod simulation;
mod statistics;

pub use forecast::{
    DailyForecast, DailyForecastPoint, DailyForecastRow, ForecastMetrics, ForecastReport,
    NormalizedWindow, YearlyForecast, YearlyForecastPoint, YearlyForecastRow, MAX_HORIZON,
    PROJECTION_YEARS, WINDOW_LEN,
};
pub use price_point::{PricePoint, PriceSeries, RawPriceRow, RawValue};
pub use scaler::MinMaxScaler;
pub use simulation::{SimulationMode, SimulationPoint, SimulationResult};
pub use statistics::{
    ColumnSummary, CorrelationMatrix, PriceHighlights, ReferenceSummary, SeriesSummary,
    TablePreview,
};

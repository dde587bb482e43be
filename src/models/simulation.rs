use serde::{Deserialize, Serialize};

/// How each random-walk step moves the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Multiply by a uniform factor in [-2%, +2%)
    #[default]
    Percent,
    /// Add a uniform amount in [-5, +5)
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub day: usize,
    pub price: f64,
}

/// A simulated price path. `points[0]` is the initial price on day 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub mode: SimulationMode,
    pub initial_price: f64,
    pub final_price: f64,
    pub points: Vec<SimulationPoint>,
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("window shape mismatch: expected {expected} values, got {actual}")]
    WindowShape { expected: usize, actual: usize },

    #[error("model produced a non-finite value: {0}")]
    NonFiniteOutput(f64),

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("inference error: {0}")]
    Inference(String),
}

/// A pretrained one-step-ahead predictor over a window of normalized prices.
///
/// Implementations are loaded once at startup and shared read-only between
/// requests, so `predict_next` takes `&self`.
pub trait SequenceModel: Send + Sync {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError>;
}

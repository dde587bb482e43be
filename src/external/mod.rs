pub mod lstm_model;
pub mod sequence_model;

use std::path::Path;

use anyhow::Context;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::external::sequence_model::{ModelError, SequenceModel};

/// Weights of one LSTM layer as stored on disk. Matrices are row-major,
/// `[hidden_size][input_size]` for input weights and
/// `[hidden_size][hidden_size]` for recurrent weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayerWeights {
    pub input_size: usize,
    pub hidden_size: usize,
    pub w_ii: Vec<Vec<f64>>,
    pub w_hi: Vec<Vec<f64>>,
    pub b_i: Vec<f64>,
    pub w_if: Vec<Vec<f64>>,
    pub w_hf: Vec<Vec<f64>>,
    pub b_f: Vec<f64>,
    pub w_ig: Vec<Vec<f64>>,
    pub w_hg: Vec<Vec<f64>>,
    pub b_g: Vec<f64>,
    pub w_io: Vec<Vec<f64>>,
    pub w_ho: Vec<Vec<f64>>,
    pub b_o: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseWeights {
    /// `[1][hidden_size]`: the head emits a single value.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// On-disk layout of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmModelFile {
    pub window_len: usize,
    pub layers: Vec<LstmLayerWeights>,
    pub dense: DenseWeights,
}

struct LstmCell {
    hidden_size: usize,
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

impl LstmCell {
    fn from_weights(layer: LstmLayerWeights, index: usize) -> Result<Self, ModelError> {
        let input = (layer.hidden_size, layer.input_size);
        let recurrent = (layer.hidden_size, layer.hidden_size);
        let hidden = layer.hidden_size;
        let name = |field: &str| format!("layers[{}].{}", index, field);

        Ok(Self {
            hidden_size: hidden,
            w_ii: to_matrix(&name("w_ii"), layer.w_ii, input)?,
            w_hi: to_matrix(&name("w_hi"), layer.w_hi, recurrent)?,
            b_i: to_vector(&name("b_i"), layer.b_i, hidden)?,
            w_if: to_matrix(&name("w_if"), layer.w_if, input)?,
            w_hf: to_matrix(&name("w_hf"), layer.w_hf, recurrent)?,
            b_f: to_vector(&name("b_f"), layer.b_f, hidden)?,
            w_ig: to_matrix(&name("w_ig"), layer.w_ig, input)?,
            w_hg: to_matrix(&name("w_hg"), layer.w_hg, recurrent)?,
            b_g: to_vector(&name("b_g"), layer.b_g, hidden)?,
            w_io: to_matrix(&name("w_io"), layer.w_io, input)?,
            w_ho: to_matrix(&name("w_ho"), layer.w_ho, recurrent)?,
            b_o: to_vector(&name("b_o"), layer.b_o, hidden)?,
        })
    }

    /// One time step. Returns (h_next, c_next).
    fn forward(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let i_gate = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f_gate = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));
        let o_gate = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        // c = f * c_prev + i * g
        let c_next = &f_gate * c_prev + &i_gate * &g;
        // h = o * tanh(c)
        let h_next = &o_gate * &tanh(&c_next);

        (h_next, c_next)
    }

    fn init_hidden(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }
}

/// Stacked LSTM with a linear single-output head, run forward only.
pub struct LstmModel {
    window_len: usize,
    cells: Vec<LstmCell>,
    dense_w: Array2<f64>,
    dense_b: Array1<f64>,
}

impl LstmModel {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {:?}", path))?;
        let file: LstmModelFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model file: {:?}", path))?;
        let model = Self::from_weights(file)
            .with_context(|| format!("Invalid model weights in {:?}", path))?;

        info!(
            "Loaded LSTM model from {:?} ({} layer(s), window {})",
            path,
            model.cells.len(),
            model.window_len
        );
        Ok(model)
    }

    pub fn from_weights(file: LstmModelFile) -> Result<Self, ModelError> {
        if file.window_len == 0 {
            return Err(ModelError::InvalidWeights("window_len must be positive".to_string()));
        }
        if file.layers.is_empty() {
            return Err(ModelError::InvalidWeights("model has no LSTM layers".to_string()));
        }

        let mut expected_input = 1;
        let mut cells = Vec::with_capacity(file.layers.len());
        for (index, layer) in file.layers.into_iter().enumerate() {
            if layer.input_size != expected_input {
                return Err(ModelError::InvalidWeights(format!(
                    "layers[{}] expects input size {}, got {}",
                    index, expected_input, layer.input_size
                )));
            }
            if layer.hidden_size == 0 {
                return Err(ModelError::InvalidWeights(format!(
                    "layers[{}] has zero hidden units",
                    index
                )));
            }
            expected_input = layer.hidden_size;
            cells.push(LstmCell::from_weights(layer, index)?);
        }

        let dense_w = to_matrix("dense.weights", file.dense.weights, (1, expected_input))?;
        let dense_b = to_vector("dense.bias", file.dense.bias, 1)?;

        Ok(Self {
            window_len: file.window_len,
            cells,
            dense_w,
            dense_b,
        })
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    fn forward(&self, window: &[f64]) -> f64 {
        let mut states: Vec<(Array1<f64>, Array1<f64>)> =
            self.cells.iter().map(|cell| cell.init_hidden()).collect();

        for &x in window {
            let mut layer_input = Array1::from_elem(1, x);
            for (layer_idx, cell) in self.cells.iter().enumerate() {
                let (h_prev, c_prev) = &states[layer_idx];
                let (h_next, c_next) = cell.forward(&layer_input, h_prev, c_prev);
                layer_input = h_next.clone();
                states[layer_idx] = (h_next, c_next);
            }
        }

        // Last hidden state of the top layer feeds the dense head
        let final_hidden = &states[self.cells.len() - 1].0;
        let output = self.dense_w.dot(final_hidden) + &self.dense_b;
        output[0]
    }
}

impl SequenceModel for LstmModel {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.len() != self.window_len {
            return Err(ModelError::WindowShape {
                expected: self.window_len,
                actual: window.len(),
            });
        }
        let value = self.forward(window);
        if !value.is_finite() {
            return Err(ModelError::NonFiniteOutput(value));
        }
        Ok(value)
    }
}

fn to_matrix(
    name: &str,
    rows: Vec<Vec<f64>>,
    shape: (usize, usize),
) -> Result<Array2<f64>, ModelError> {
    if rows.len() != shape.0 || rows.iter().any(|row| row.len() != shape.1) {
        return Err(ModelError::InvalidWeights(format!(
            "{} must be {}x{}",
            name, shape.0, shape.1
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec(shape, flat)
        .map_err(|e| ModelError::InvalidWeights(format!("{}: {}", name, e)))
}

fn to_vector(name: &str, values: Vec<f64>, len: usize) -> Result<Array1<f64>, ModelError> {
    if values.len() != len {
        return Err(ModelError::InvalidWeights(format!(
            "{} must have {} entries, got {}",
            name,
            len,
            values.len()
        )));
    }
    Ok(Array1::from_vec(values))
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rows: usize, cols: usize, value: f64) -> Vec<Vec<f64>> {
        vec![vec![value; cols]; rows]
    }

    fn layer(input_size: usize, hidden_size: usize, weight: f64) -> LstmLayerWeights {
        LstmLayerWeights {
            input_size,
            hidden_size,
            w_ii: filled(hidden_size, input_size, weight),
            w_hi: filled(hidden_size, hidden_size, weight),
            b_i: vec![0.0; hidden_size],
            w_if: filled(hidden_size, input_size, weight),
            w_hf: filled(hidden_size, hidden_size, weight),
            b_f: vec![0.0; hidden_size],
            w_ig: filled(hidden_size, input_size, weight),
            w_hg: filled(hidden_size, hidden_size, weight),
            b_g: vec![0.0; hidden_size],
            w_io: filled(hidden_size, input_size, weight),
            w_ho: filled(hidden_size, hidden_size, weight),
            b_o: vec![0.0; hidden_size],
        }
    }

    fn model_file(layers: Vec<LstmLayerWeights>, dense_weight: f64, bias: f64) -> LstmModelFile {
        let hidden = layers.last().map(|l| l.hidden_size).unwrap_or(1);
        LstmModelFile {
            window_len: 60,
            layers,
            dense: DenseWeights {
                weights: filled(1, hidden, dense_weight),
                bias: vec![bias],
            },
        }
    }

    #[test]
    fn test_zero_weights_output_dense_bias() {
        let model = LstmModel::from_weights(model_file(vec![layer(1, 4, 0.0)], 0.0, 0.42)).unwrap();
        let value = model.predict_next(&[0.3; 60]).unwrap();
        assert!((value - 0.42).abs() < 1e-12);
    }

    #[test]
    fn test_stacked_layers_produce_finite_output() {
        let file = model_file(vec![layer(1, 3, 0.1), layer(3, 2, -0.2)], 0.5, 0.1);
        let model = LstmModel::from_weights(file).unwrap();
        let window: Vec<f64> = (0..60).map(|i| i as f64 / 60.0).collect();
        let value = model.predict_next(&window).unwrap();
        assert!(value.is_finite());
        // |h| < 1 for every unit, so the head output stays within bias +- sum|w|
        assert!((value - 0.1).abs() < 1.0);
    }

    #[test]
    fn test_wrong_window_length_is_rejected() {
        let model = LstmModel::from_weights(model_file(vec![layer(1, 2, 0.0)], 0.0, 0.0)).unwrap();
        let err = model.predict_next(&[0.1; 59]).unwrap_err();
        let expected = ModelError::WindowShape {
            expected: 60,
            actual: 59,
        };
        assert_eq!(err, expected);
    }

    #[test]
    fn test_mismatched_layer_sizes_rejected() {
        let file = model_file(vec![layer(1, 3, 0.1), layer(2, 2, 0.1)], 0.1, 0.0);
        assert!(matches!(LstmModel::from_weights(file), Err(ModelError::InvalidWeights(_))));

        let mut bad_dense = model_file(vec![layer(1, 3, 0.1)], 0.1, 0.0);
        bad_dense.dense.weights = filled(1, 2, 0.1);
        assert!(matches!(LstmModel::from_weights(bad_dense), Err(ModelError::InvalidWeights(_))));
    }

    #[test]
    fn test_model_file_loads_from_json() {
        let file = model_file(vec![layer(1, 2, 0.0)], 0.0, 0.25);
        let path = std::env::temp_dir().join(format!("lstm-model-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let model = LstmModel::from_file(&path).unwrap();
        assert_eq!(model.window_len(), 60);
        assert!((model.predict_next(&[0.0; 60]).unwrap() - 0.25).abs() < 1e-12);

        std::fs::remove_file(&path).ok();
    }
}

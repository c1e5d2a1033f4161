use crate::{Error, Result};
use burn::prelude::*;
use burn::tensor::TensorData;

/// A batch of sparse feature rows, each a variable-length list of
/// `(feature index, value)` pairs, materialized as a pair of padded dense
/// tensors.
///
/// Padding slots use index 0 with weight 0.0, so they contribute exactly
/// nothing to any weighted sum over the rows: an example with no active
/// features reduces to an all-padding row.
///
/// # Shapes
///   - indices: `[batch_size, max_active]`
///   - weights: `[batch_size, max_active]`
#[derive(Debug, Clone)]
pub struct SparseFeatures<B: Backend> {
    pub indices: Tensor<B, 2, Int>,
    pub weights: Tensor<B, 2>,
}

impl<B: Backend> SparseFeatures<B> {
    /// Pad a batch of `(index, value)` rows into the dense pair.
    ///
    /// The padded width is the widest row in the batch, at least 1 so that
    /// a batch of all-empty rows still has a well-formed shape.
    pub fn from_rows(rows: &[Vec<(i64, f32)>], device: &B::Device) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let max_active = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut indices = vec![0i64; rows.len() * max_active];
        let mut weights = vec![0f32; rows.len() * max_active];
        for (r, row) in rows.iter().enumerate() {
            for (c, &(index, value)) in row.iter().enumerate() {
                indices[r * max_active + c] = index;
                weights[r * max_active + c] = value;
            }
        }

        let shape = [rows.len(), max_active];
        Ok(Self {
            indices: Tensor::from_data(TensorData::new(indices, shape), device),
            weights: Tensor::from_data(TensorData::new(weights, shape), device),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.indices.dims()[0]
    }

    pub fn max_active(&self) -> usize {
        self.indices.dims()[1]
    }
}

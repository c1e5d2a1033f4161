use burn::prelude::*;

/// Half the sum of squared entries, `sum(t²) / 2`.
///
/// This is the classic weight-decay penalty; the halving keeps its gradient
/// equal to the tensor itself.
///
/// # Shapes
///   - input: `[..., any]`
///   - output: `[1]`
pub fn l2_loss<const D: usize, B: Backend>(t: Tensor<B, D>) -> Tensor<B, 1> {
    t.powf_scalar(2.0).sum() / 2.0
}

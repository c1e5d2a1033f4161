use burn::prelude::*;

/// Applies the log sigmoid function element-wise.
///
/// `log_sigmoid(x) = log(1 / (1 + exp(-x)))`
///
/// Computed as `min(x, 0) - log1p(exp(-|x|))`, which never overflows the
/// exponential for large `|x|`.
pub fn log_sigmoid<const D: usize, B: Backend>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clone().clamp_max(0.0) - x.abs().neg().exp().log1p()
}

use burn::module::Module;
use burn::prelude::*;
use burn::tensor::activation::log_softmax;

/// Mean softmax cross-entropy against one-hot (or soft) target
/// distributions.
#[derive(Module, Clone, Debug, Default)]
pub struct OneHotCrossEntropyLoss;

impl OneHotCrossEntropyLoss {
    /// Create the criterion.
    pub fn new() -> Self {
        Self
    }

    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///   - scores: `[batch_size, num_classes]`
    ///   - targets: `[batch_size, num_classes]`, rows summing to 1
    ///   - output: `[1]`
    pub fn forward<B: Backend>(&self, scores: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        let log_probs = log_softmax(scores, 1);
        (log_probs * targets).sum_dim(1).neg().mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray;

    #[test]
    fn uniform_scores_cost_log_nclass() {
        let device = Default::default();
        let scores = Tensor::<TB, 2>::zeros([3, 4], &device);
        let targets = Tensor::<TB, 2>::from_floats(
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            &device,
        );
        let loss: f32 = OneHotCrossEntropyLoss::new()
            .forward(scores, targets)
            .into_scalar();
        assert!((loss - 4f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn confident_correct_scores_cost_little() {
        let device = Default::default();
        let scores =
            Tensor::<TB, 2>::from_floats([[20.0, 0.0, 0.0], [0.0, 20.0, 0.0]], &device);
        let targets =
            Tensor::<TB, 2>::from_floats([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &device);
        let loss: f32 = OneHotCrossEntropyLoss::new()
            .forward(scores, targets)
            .into_scalar();
        assert!(loss < 1e-6);
    }
}

use crate::utils::log_sigmoid::log_sigmoid;
use burn::module::Module;
use burn::prelude::*;

/// Configuration to create a [Binary Cross-entropy loss](BinaryCrossEntropyLoss) using the [init function](BinaryCrossEntropyLossConfig::init).
#[derive(Config, Debug)]
pub struct BinaryCrossEntropyLossConfig {
    /// Treat the inputs as logits, applying a sigmoid activation when computing the loss.
    #[config(default = true)]
    pub logits: bool,
}

impl BinaryCrossEntropyLossConfig {
    /// Initialize [Binary Cross-entropy loss](BinaryCrossEntropyLoss).
    pub fn init(&self) -> BinaryCrossEntropyLoss {
        BinaryCrossEntropyLoss {
            logits: self.logits,
        }
    }
}

/// Mean binary cross-entropy between predictions and float targets in `[0, 1]`.
///
/// Should be created using [BinaryCrossEntropyLossConfig].
#[derive(Module, Clone, Debug)]
pub struct BinaryCrossEntropyLoss {
    /// Treat the inputs as logits
    pub logits: bool,
}

impl BinaryCrossEntropyLoss {
    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///   - predictions: `[batch_size]`
    ///   - targets: `[batch_size]`
    ///   - output: `[1]`
    pub fn forward<const D: usize, B: Backend>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let loss = if self.logits {
            // (1 - y) * x - log(sigmoid(x)), stable for any logit magnitude
            (targets.neg() + 1.0) * predictions.clone() - log_sigmoid(predictions)
        } else {
            // clamp at -100 so log(0) stays finite
            (targets.clone() - 1.0) * predictions.clone().neg().log1p().clamp_min(-100.0)
                - targets * predictions.log().clamp_min(-100.0)
        };

        loss.mean()
    }
}

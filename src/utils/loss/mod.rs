mod bce;
mod cross_entropy;

pub use bce::{BinaryCrossEntropyLoss, BinaryCrossEntropyLossConfig};
pub use cross_entropy::OneHotCrossEntropyLoss;

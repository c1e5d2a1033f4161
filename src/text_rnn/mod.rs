mod cell;
mod classifier;
mod network;

pub use cell::{BasicRnn, BasicRnnConfig, CellType, RecurrentCell, RecurrentCellConfig};
pub use classifier::{EvalOutput, TextRnnClassifier, TextRnnClassifierConfig};
pub use network::{TextRnn, TextRnnConfig};

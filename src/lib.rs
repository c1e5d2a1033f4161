//! Shallow supervised classifiers built on the [`burn`] tensor/autodiff
//! stack: a factorization machine over sparse categorical features and a
//! recurrent text classifier.
//!
//! Both families follow the same shape: a `Config` describing the graph, an
//! initialized `Module` holding the parameters, and a classifier wrapper
//! that owns the optimizer and exposes `train_step` / `eval_step` /
//! `predict` over concrete batches.

#[cfg(feature = "fm")]
pub mod fm;
pub mod metrics;
#[cfg(feature = "fm")]
pub mod sparse;
#[cfg(feature = "text-rnn")]
pub mod text_rnn;
pub mod utils;

pub mod prelude {
    #[cfg(feature = "fm")]
    pub use crate::fm::*;
    #[cfg(feature = "fm")]
    pub use crate::sparse::SparseFeatures;
    #[cfg(feature = "text-rnn")]
    pub use crate::text_rnn::*;
    pub use crate::{Error, Result};
}

/// Failure modes surfaced at configuration or input-construction time.
///
/// Dimension mismatches between a built graph and actual batch data are
/// reported by the backend at evaluation time and are not re-validated
/// here.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A recurrent cell spelling that names no supported variant.
    #[error("unknown recurrent cell type: {0:?}")]
    UnknownCellType(String),

    /// A batch constructor was handed zero examples.
    #[error("batch must contain at least one example")]
    EmptyBatch,
}

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

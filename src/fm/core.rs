//! Factorization machine scoring graph over sparse categorical input.
//!
//! Pairwise feature interactions are folded through a low-rank latent
//! matrix instead of an explicit interaction matrix, via the identity
//! `Σ_{i<j} (v_i·v_j) x_i x_j = ½ [(Σ_i v_i x_i)² − Σ_i (v_i x_i)²]`.

use crate::sparse::SparseFeatures;
use crate::utils::l2_loss;
use burn::module::Param;
use burn::nn::Initializer;
use burn::prelude::*;
use burn::tensor::module::embedding;

#[derive(Module, Debug)]
pub struct FmCore<B: Backend> {
    /// Global bias.
    ///
    /// # Shape
    /// [1]
    pub w0: Param<Tensor<B, 1>>,
    /// First-order weights.
    ///
    /// # Shape
    /// [inp_dim, 1]
    pub w: Param<Tensor<B, 2>>,
    /// Latent interaction factors.
    ///
    /// # Shape
    /// [inp_dim, hid_dim]
    pub v: Param<Tensor<B, 2>>,
    pub lambda_w: f64,
    pub lambda_v: f64,
}

#[derive(Config, Debug)]
pub struct FmCoreConfig {
    /// Number of distinct features.
    pub inp_dim: usize,

    /// Width of the latent factor space.
    #[config(default = 8)]
    pub hid_dim: usize,

    /// L2 coefficient shared by the bias and the first-order weights.
    #[config(default = 0.0)]
    pub lambda_w: f64,

    /// L2 coefficient for the latent factors.
    #[config(default = 0.0)]
    pub lambda_v: f64,
}

impl FmCoreConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FmCore<B> {
        FmCore {
            w0: Initializer::Constant { value: 0.1 }.init([1], device),
            w: Initializer::XavierUniform { gain: 1.0 }.init_with(
                [self.inp_dim, 1],
                Some(self.inp_dim),
                Some(1),
                device,
            ),
            v: Initializer::XavierUniform { gain: 1.0 }.init_with(
                [self.inp_dim, self.hid_dim],
                Some(self.inp_dim),
                Some(self.hid_dim),
                device,
            ),
            lambda_w: self.lambda_w,
            lambda_v: self.lambda_v,
        }
    }
}

impl<B: Backend> FmCore<B> {
    /// Score each example: bias + first-order term + pairwise term.
    ///
    /// An all-padding row scores exactly the bias: its weights zero out
    /// both weighted sums.
    ///
    /// # Shapes
    ///   - Input [batch, max_active] index/weight pair
    ///   - Output [batch]
    pub fn forward(&self, x: &SparseFeatures<B>) -> Tensor<B, 1> {
        let [batch, max_active] = x.indices.dims();
        let [_inp_dim, hid_dim] = self.v.dims();

        let weights = x.weights.clone().reshape([batch, max_active, 1]);

        // 1-way: sparse-weighted sum over w, plus the bias
        let w_rows = embedding(self.w.val(), x.indices.clone());
        debug_assert_eq!([batch, max_active, 1], w_rows.dims());
        let linear = (w_rows * weights.clone()).sum_dim(1).reshape([batch]) + self.w0.val();

        // 2-way: ½ [(Σ v_i x_i)² − Σ (v_i x_i)²] over the latent dimension
        let vx = embedding(self.v.val(), x.indices.clone()) * weights.clone();
        debug_assert_eq!([batch, max_active, hid_dim], vx.dims());
        let left = vx.sum_dim(1).powf_scalar(2.0);
        let right = (embedding(self.v.val().powf_scalar(2.0), x.indices.clone())
            * weights.powf_scalar(2.0))
        .sum_dim(1);
        debug_assert_eq!([batch, 1, hid_dim], left.dims());
        let pairwise = (left - right).sum_dim(2).reshape([batch]) * 0.5;

        linear + pairwise
    }

    /// L2 penalty over the parameters: `lambda_w` covers the bias and the
    /// first-order weights, `lambda_v` the latent factors.
    ///
    /// # Shapes
    ///   - Output [1]
    pub fn regularization(&self) -> Tensor<B, 1> {
        (l2_loss(self.w0.val()) + l2_loss(self.w.val())) * self.lambda_w
            + l2_loss(self.v.val()) * self.lambda_v
    }
}

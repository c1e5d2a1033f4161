use crate::fm::{FmCore, FmCoreConfig};
use crate::sparse::SparseFeatures;
use crate::utils::loss::{BinaryCrossEntropyLoss, BinaryCrossEntropyLossConfig};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;
use tracing::debug;

#[derive(Config, Debug)]
pub struct FmClassifierConfig {
    /// Number of distinct features.
    pub inp_dim: usize,

    #[config(default = 16)]
    pub hid_dim: usize,

    #[config(default = 0.0)]
    pub lambda_w: f64,

    #[config(default = 0.0)]
    pub lambda_v: f64,

    #[config(default = 1e-4)]
    pub lr: f64,
}

/// Binary classifier over the factorization machine score: sigmoid
/// cross-entropy plus the core's L2 penalty, minimized by Adam.
///
/// Owns the optimizer state and a step counter incremented once per
/// successful [`train_step`](Self::train_step).
pub struct FmClassifier<B: AutodiffBackend> {
    pub model: FmCore<B>,
    loss: BinaryCrossEntropyLoss,
    optim: OptimizerAdaptor<Adam, FmCore<B>, B>,
    lr: f64,
    global_step: usize,
}

impl FmClassifierConfig {
    /// Returns the initialized classifier.
    pub fn init<B: AutodiffBackend>(&self, device: &B::Device) -> FmClassifier<B> {
        let model = FmCoreConfig::new(self.inp_dim)
            .with_hid_dim(self.hid_dim)
            .with_lambda_w(self.lambda_w)
            .with_lambda_v(self.lambda_v)
            .init(device);

        FmClassifier {
            model,
            loss: BinaryCrossEntropyLossConfig::new().init(),
            optim: AdamConfig::new().init(),
            lr: self.lr,
            global_step: 0,
        }
    }
}

impl<B: AutodiffBackend> FmClassifier<B> {
    /// Apply one Adam update on a batch and return the total loss that was
    /// minimized.
    ///
    /// # Shapes
    ///   - x: [batch, max_active] index/weight pairs
    ///   - y: [batch] binary labels in {0.0, 1.0}
    pub fn train_step(&mut self, x: &SparseFeatures<B>, y: Tensor<B, 1>) -> f32 {
        let scores = self.model.forward(x);
        let loss = self.loss.forward(scores, y) + self.model.regularization();

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);
        self.global_step += 1;

        let loss: f32 = loss.into_scalar().elem();
        debug!(step = self.global_step, loss, "fm train step");
        loss
    }

    /// Total loss over a batch, with no parameter update.
    pub fn eval_step(
        &self,
        x: &SparseFeatures<B::InnerBackend>,
        y: Tensor<B::InnerBackend, 1>,
    ) -> f32 {
        let model = self.model.valid();
        let loss = self.loss.forward(model.forward(x), y) + model.regularization();
        loss.into_scalar().elem()
    }

    /// Raw scores (logits) for a batch.
    ///
    /// # Shapes
    ///   - Output [batch]
    pub fn predict(&self, x: &SparseFeatures<B::InnerBackend>) -> Tensor<B::InnerBackend, 1> {
        self.model.valid().forward(x)
    }

    /// Number of parameter updates applied so far.
    pub fn global_step(&self) -> usize {
        self.global_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray;
    type TAB = burn::backend::Autodiff<TB>;

    /// Linearly separable toy batch: feature 0 active ⇒ label 1,
    /// feature 1 active ⇒ label 0.
    fn toy_batch(device: &<TAB as Backend>::Device) -> (SparseFeatures<TAB>, Tensor<TAB, 1>) {
        let x = SparseFeatures::from_rows(
            &[
                vec![(0, 1.0)],
                vec![(1, 1.0)],
                vec![(0, 1.0), (2, 1.0)],
                vec![(1, 1.0), (2, 1.0)],
            ],
            device,
        )
        .unwrap();
        let y = Tensor::from_floats([1.0, 0.0, 1.0, 0.0], device);
        (x, y)
    }

    #[test]
    fn training_decreases_loss_on_separable_data() {
        let device = Default::default();
        TAB::seed(42);
        let mut classifier = FmClassifierConfig::new(3)
            .with_hid_dim(4)
            .with_lr(0.05)
            .init::<TAB>(&device);

        let (x, y) = toy_batch(&device);
        let first = classifier.train_step(&x, y.clone());
        let mut last = first;
        for _ in 0..50 {
            last = classifier.train_step(&x, y.clone());
        }
        assert!(last < first, "loss {last} did not decrease from {first}");
    }

    #[test]
    fn global_step_counts_updates() {
        let device = Default::default();
        TAB::seed(7);
        let mut classifier = FmClassifierConfig::new(3).init::<TAB>(&device);
        assert_eq!(classifier.global_step(), 0);

        let (x, y) = toy_batch(&device);
        classifier.train_step(&x, y.clone());
        classifier.train_step(&x, y);
        assert_eq!(classifier.global_step(), 2);
    }

    #[test]
    fn eval_and_predict_surface_values() {
        let device = Default::default();
        TAB::seed(3);
        let classifier = FmClassifierConfig::new(3).init::<TAB>(&device);

        let x = SparseFeatures::<TB>::from_rows(&[vec![(0, 1.0)], vec![(1, 2.0)]], &device)
            .unwrap();
        let y = Tensor::<TB, 1>::from_floats([1.0, 0.0], &device);

        let loss = classifier.eval_step(&x, y);
        assert!(loss.is_finite() && loss > 0.0);

        let scores = classifier.predict(&x).into_data().to_vec::<f32>().unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn eval_step_does_not_touch_parameters() {
        let device = Default::default();
        TAB::seed(11);
        let classifier = FmClassifierConfig::new(3).init::<TAB>(&device);
        let before = classifier.model.w.val().into_data();

        let x = SparseFeatures::<TB>::from_rows(&[vec![(0, 1.0)]], &device).unwrap();
        let y = Tensor::<TB, 1>::from_floats([1.0], &device);
        classifier.eval_step(&x, y);

        classifier
            .model
            .w
            .val()
            .into_data()
            .assert_eq(&before, true);
    }
}

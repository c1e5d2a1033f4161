use crate::metrics;
use crate::text_rnn::network::{TextRnn, TextRnnConfig};
use crate::utils::loss::OneHotCrossEntropyLoss;
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;
use tracing::debug;

#[derive(Config, Debug)]
pub struct TextRnnClassifierConfig {
    pub network: TextRnnConfig,

    #[config(default = 1e-3)]
    pub lr: f64,
}

/// Metrics surfaced by one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub loss: f32,
    pub accuracy: f32,
    /// Binary discrimination metric; `Some` only when the model declares
    /// exactly two classes.
    pub auc: Option<f32>,
}

/// Multi-class classifier over the sequence encoder: mean softmax
/// cross-entropy against one-hot labels plus the head's L2 penalty,
/// minimized by Adam.
///
/// Owns the optimizer state and a step counter incremented once per
/// successful [`train_step`](Self::train_step).
pub struct TextRnnClassifier<B: AutodiffBackend> {
    pub model: TextRnn<B>,
    loss: OneHotCrossEntropyLoss,
    optim: OptimizerAdaptor<Adam, TextRnn<B>, B>,
    lr: f64,
    global_step: usize,
}

impl TextRnnClassifierConfig {
    /// Returns the initialized classifier.
    pub fn init<B: AutodiffBackend>(&self, device: &B::Device) -> TextRnnClassifier<B> {
        Self::wrap(self.network.init(device), self.lr)
    }

    /// Returns the initialized classifier around a pre-trained embedding
    /// matrix (see [`TextRnnConfig::init_with_embedding`]).
    pub fn init_with_embedding<B: AutodiffBackend>(
        &self,
        init_embed: Tensor<B, 2>,
        device: &B::Device,
    ) -> TextRnnClassifier<B> {
        Self::wrap(self.network.init_with_embedding(init_embed, device), self.lr)
    }

    fn wrap<B: AutodiffBackend>(model: TextRnn<B>, lr: f64) -> TextRnnClassifier<B> {
        TextRnnClassifier {
            model,
            loss: OneHotCrossEntropyLoss::new(),
            optim: AdamConfig::new().init(),
            lr,
            global_step: 0,
        }
    }
}

impl<B: AutodiffBackend> TextRnnClassifier<B> {
    /// Apply one Adam update on a batch (dropout active) and return the
    /// total loss that was minimized.
    ///
    /// # Shapes
    ///   - tokens: [batch, seq_len], 0 = padding
    ///   - labels: [batch, nclass] one-hot rows
    pub fn train_step(&mut self, tokens: Tensor<B, 2, Int>, labels: Tensor<B, 2>) -> f32 {
        let scores = self.model.forward(tokens);
        let loss = self.loss.forward(scores, labels) + self.model.regularization();

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);
        self.global_step += 1;

        let loss: f32 = loss.into_scalar().elem();
        debug!(step = self.global_step, loss, "text rnn train step");
        loss
    }

    /// Loss, accuracy and (for two-class models) AUC over a batch, with
    /// dropout bypassed and no parameter update.
    pub fn eval_step(
        &self,
        tokens: Tensor<B::InnerBackend, 2, Int>,
        labels: Tensor<B::InnerBackend, 2>,
    ) -> EvalOutput {
        let [batch, _nclass] = labels.dims();
        let model = self.model.valid();

        let scores = model.forward(tokens);
        let loss = self.loss.forward(scores.clone(), labels.clone()) + model.regularization();

        let label_classes = labels.argmax(1).reshape([batch]);
        let predictions = scores.clone().argmax(1).reshape([batch]);
        let accuracy = metrics::accuracy(predictions, label_classes.clone());

        // the positive-class probability only means something for a
        // two-class head
        let auc = (model.nclass() == 2).then(|| {
            let positive = softmax(scores, 1).narrow(1, 1, 1).reshape([batch]);
            metrics::binary_auc(positive, label_classes)
        });

        EvalOutput {
            loss: loss.into_scalar().elem(),
            accuracy,
            auc: auc.flatten(),
        }
    }

    /// Arg-max class per example.
    ///
    /// # Shapes
    ///   - Output [batch]
    pub fn predict(&self, tokens: Tensor<B::InnerBackend, 2, Int>) -> Tensor<B::InnerBackend, 1, Int> {
        let [batch, _seq_len] = tokens.dims();
        self.model.valid().forward(tokens).argmax(1).reshape([batch])
    }

    /// Raw per-class scores.
    ///
    /// # Shapes
    ///   - Output [batch, nclass]
    pub fn scores(&self, tokens: Tensor<B::InnerBackend, 2, Int>) -> Tensor<B::InnerBackend, 2> {
        self.model.valid().forward(tokens)
    }

    /// Number of parameter updates applied so far.
    pub fn global_step(&self) -> usize {
        self.global_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_rnn::cell::CellType;
    use burn::tensor::TensorData;

    type TB = burn::backend::NdArray;
    type TAB = burn::backend::Autodiff<TB>;

    fn config(nclass: usize) -> TextRnnClassifierConfig {
        TextRnnClassifierConfig::new(
            TextRnnConfig::new(10)
                .with_emb_dim(4)
                .with_hid_dim(6)
                .with_nclass(nclass)
                .with_seq_len(5)
                .with_dropout(0.0),
        )
        .with_lr(0.01)
    }

    fn tokens<B: Backend>(rows: &[&[i64]], width: usize, device: &B::Device) -> Tensor<B, 2, Int> {
        let mut padded = vec![0i64; rows.len() * width];
        for (r, row) in rows.iter().enumerate() {
            padded[r * width..r * width + row.len()].copy_from_slice(row);
        }
        Tensor::from_data(TensorData::new(padded, [rows.len(), width]), device)
    }

    fn one_hot<B: Backend>(classes: &[usize], nclass: usize, device: &B::Device) -> Tensor<B, 2> {
        let mut rows = vec![0f32; classes.len() * nclass];
        for (r, &c) in classes.iter().enumerate() {
            rows[r * nclass + c] = 1.0;
        }
        Tensor::from_data(TensorData::new(rows, [classes.len(), nclass]), device)
    }

    #[test]
    fn training_decreases_loss_and_counts_steps() {
        let device = Default::default();
        TAB::seed(42);
        let mut classifier = config(2).init::<TAB>(&device);

        // class is decided by the first token
        let x = tokens::<TAB>(&[&[1, 2], &[1, 3], &[9, 2], &[9, 3]], 5, &device);
        let y = one_hot::<TAB>(&[0, 0, 1, 1], 2, &device);

        let first = classifier.train_step(x.clone(), y.clone());
        let mut last = first;
        for _ in 0..40 {
            last = classifier.train_step(x.clone(), y.clone());
        }
        assert!(last < first, "loss {last} did not decrease from {first}");
        assert_eq!(classifier.global_step(), 41);
    }

    #[test]
    fn eval_reports_auc_only_for_two_classes() {
        let device = Default::default();
        TAB::seed(5);

        let binary = config(2).init::<TAB>(&device);
        let out = binary.eval_step(
            tokens::<TB>(&[&[1, 2], &[3, 4]], 5, &device),
            one_hot::<TB>(&[0, 1], 2, &device),
        );
        assert!(out.auc.is_some());
        assert!(out.loss.is_finite());

        let ternary = config(3).init::<TAB>(&device);
        let out = ternary.eval_step(
            tokens::<TB>(&[&[1, 2], &[3, 4]], 5, &device),
            one_hot::<TB>(&[0, 2], 3, &device),
        );
        assert!(out.auc.is_none());
    }

    #[test]
    fn predict_and_scores_agree() {
        let device = Default::default();
        TAB::seed(9);
        let classifier = config(3).init::<TAB>(&device);
        let x = tokens::<TB>(&[&[1, 2, 3], &[4, 5, 0]], 5, &device);

        let scores = classifier.scores(x.clone());
        assert_eq!([2, 3], scores.dims());
        let from_scores = scores.argmax(1).reshape([2]);
        let predicted = classifier.predict(x);
        predicted.into_data().assert_eq(&from_scores.into_data(), true);
    }

    #[test]
    fn frozen_pretrained_embedding_stays_fixed() {
        let device = Default::default();
        TAB::seed(13);
        let embed = Tensor::<TAB, 2>::random(
            [10, 4],
            burn::tensor::Distribution::Uniform(-0.2, 0.2),
            &device,
        );

        let cfg = config(2);
        let frozen_cfg = TextRnnClassifierConfig::new(
            cfg.network.clone().with_freeze_embedding(true),
        )
        .with_lr(0.05);
        let mut frozen = frozen_cfg.init_with_embedding::<TAB>(embed.clone(), &device);

        let x = tokens::<TAB>(&[&[1, 2], &[9, 3]], 5, &device);
        let y = one_hot::<TAB>(&[0, 1], 2, &device);
        frozen.train_step(x.clone(), y.clone());
        frozen
            .model
            .embedding
            .weight
            .val()
            .into_data()
            .assert_eq(&embed.clone().inner().into_data(), true);

        // the same setup without the freeze flag must move the matrix
        let mut tunable = cfg.init_with_embedding::<TAB>(embed.clone(), &device);
        tunable.train_step(x, y);
        let moved = tunable.model.embedding.weight.val().inner().into_data();
        assert_ne!(
            moved.to_vec::<f32>().unwrap(),
            embed.inner().into_data().to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn eval_accuracy_matches_label_agreement() {
        let device = Default::default();
        TAB::seed(21);
        let classifier = config(2).init::<TAB>(&device);
        let x = tokens::<TB>(&[&[1, 2], &[3, 4]], 5, &device);

        // label everything with the model's own predictions: accuracy 1.0
        let predicted: Vec<i64> = classifier
            .predict(x.clone())
            .into_data()
            .to_vec()
            .unwrap();
        let agree = one_hot::<TB>(
            &predicted.iter().map(|&c| c as usize).collect::<Vec<_>>(),
            2,
            &device,
        );
        let out = classifier.eval_step(x.clone(), agree);
        assert_eq!(out.accuracy, 1.0);

        // label everything with the opposite class: accuracy 0.0
        let disagree = one_hot::<TB>(
            &predicted.iter().map(|&c| 1 - c as usize).collect::<Vec<_>>(),
            2,
            &device,
        );
        let out = classifier.eval_step(x, disagree);
        assert_eq!(out.accuracy, 0.0);
    }
}

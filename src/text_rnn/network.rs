//! Sequence-encoding graph: embedding → recurrent stack → linear head.
//!
//! Token id 0 is padding. Each example is read up to its true length (the
//! count of non-zero ids) and classified from the hidden state at that
//! last real step, so trailing padding never reaches the head.

use crate::text_rnn::cell::{CellType, RecurrentCell, RecurrentCellConfig};
use crate::utils::l2_loss;
use burn::module::Param;
use burn::nn::{
    Dropout, DropoutConfig, Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig,
};
use burn::prelude::*;

#[derive(Module, Debug)]
pub struct TextRnn<B: Backend> {
    pub embedding: Embedding<B>,
    pub layers: Vec<RecurrentCell<B>>,
    pub dropout: Dropout,
    pub head: Linear<B>,
    pub seq_len: usize,
    pub reg_lambda: f64,
}

#[derive(Config, Debug)]
pub struct TextRnnConfig {
    /// Token vocabulary size, including the padding id 0.
    pub vocab_size: usize,

    #[config(default = 256)]
    pub emb_dim: usize,

    #[config(default = 128)]
    pub hid_dim: usize,

    #[config(default = 1)]
    pub nclass: usize,

    /// Padded sequence length batches are expected to arrive at.
    #[config(default = 50)]
    pub seq_len: usize,

    #[config(default = "CellType::Lstm")]
    pub cell: CellType,

    #[config(default = 1)]
    pub nlayer: usize,

    /// L2 coefficient applied to the output head only.
    #[config(default = 0.0)]
    pub reg_lambda: f64,

    /// Drop probability applied to the recurrent stack's output during
    /// training; inference (through `valid()`) bypasses it.
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Whether an externally supplied embedding matrix is kept fixed
    /// rather than fine-tuned. Only consulted by
    /// [`init_with_embedding`](Self::init_with_embedding).
    #[config(default = false)]
    pub freeze_embedding: bool,
}

impl TextRnnConfig {
    /// Returns the initialized model with a freshly initialized embedding.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextRnn<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.emb_dim)
            .with_initializer(Initializer::Uniform {
                min: -0.2,
                max: 0.2,
            })
            .init(device);
        self.assemble(embedding, device)
    }

    /// Returns the initialized model wrapping a pre-trained embedding
    /// matrix, frozen iff `freeze_embedding` is set.
    ///
    /// # Shapes
    ///   - init_embed [vocab_size, emb_dim]
    pub fn init_with_embedding<B: Backend>(
        &self,
        init_embed: Tensor<B, 2>,
        device: &B::Device,
    ) -> TextRnn<B> {
        debug_assert_eq!([self.vocab_size, self.emb_dim], init_embed.dims());

        let embedding = Embedding {
            weight: Param::from_tensor(init_embed),
        };
        let embedding = if self.freeze_embedding {
            embedding.no_grad()
        } else {
            embedding
        };
        self.assemble(embedding, device)
    }

    fn assemble<B: Backend>(&self, embedding: Embedding<B>, device: &B::Device) -> TextRnn<B> {
        let mut layers = Vec::with_capacity(self.nlayer);
        for layer in 0..self.nlayer {
            let d_input = if layer == 0 { self.emb_dim } else { self.hid_dim };
            layers.push(
                RecurrentCellConfig::new(self.cell.clone(), d_input, self.hid_dim).init(device),
            );
        }

        let mut head = LinearConfig::new(self.hid_dim, self.nclass)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        head.bias = Some(Initializer::Constant { value: 0.1 }.init([self.nclass], device));

        TextRnn {
            embedding,
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            head,
            seq_len: self.seq_len,
            reg_lambda: self.reg_lambda,
        }
    }
}

impl<B: Backend> TextRnn<B> {
    /// Encode each example into the recurrent output at its true last
    /// step.
    ///
    /// The selection index is `row · seq_len + (length − 1)` into the
    /// flattened outputs, with the length clamped to at least 1 so an
    /// all-padding row reads the first step.
    ///
    /// # Shapes
    ///   - Input [batch, seq_len] of token ids, 0 = padding
    ///   - Output [batch, hid_dim]
    pub fn encode(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, seq_len] = tokens.dims();
        let [hid_dim, _nclass] = self.head.weight.dims();
        let device = tokens.device();

        // true length per row = count of non-padding ids
        let lengths = tokens
            .clone()
            .greater_elem(0)
            .int()
            .sum_dim(1)
            .reshape([batch])
            .clamp_min(1);

        let mut x = self.embedding.forward(tokens);
        for layer in self.layers.iter() {
            x = layer.forward(x);
        }
        let x = self.dropout.forward(x);
        debug_assert_eq!([batch, seq_len, hid_dim], x.dims());

        let rows = Tensor::<B, 1, Int>::arange(0..batch as i64, &device);
        let last_step = rows.mul_scalar(seq_len as i64) + lengths.sub_scalar(1);
        let flat = x.reshape([batch * seq_len, hid_dim]);
        let selected = flat.select(0, last_step);
        debug_assert_eq!([batch, hid_dim], selected.dims());

        selected
    }

    /// Per-class scores.
    ///
    /// # Shapes
    ///   - Input [batch, seq_len] of token ids, 0 = padding
    ///   - Output [batch, nclass]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, _seq_len] = tokens.dims();
        let [_hid_dim, nclass] = self.head.weight.dims();

        let scores = self.head.forward(self.encode(tokens));
        debug_assert_eq!([batch, nclass], scores.dims());

        scores
    }

    /// L2 penalty on the output head.
    ///
    /// # Shapes
    ///   - Output [1]
    pub fn regularization(&self) -> Tensor<B, 1> {
        let mut penalty = l2_loss(self.head.weight.val());
        if let Some(bias) = &self.head.bias {
            penalty = penalty + l2_loss(bias.val());
        }
        penalty * self.reg_lambda
    }

    pub fn nclass(&self) -> usize {
        self.head.weight.dims()[1]
    }
}

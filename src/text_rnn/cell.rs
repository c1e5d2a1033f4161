//! Recurrent cell variants behind a single forward capability:
//! all hidden states for a batched input sequence.

use burn::module::Param;
use burn::nn::gru::{Gru, GruConfig};
use burn::nn::{Initializer, Lstm, LstmConfig};
use burn::prelude::*;
use burn::tensor::activation::tanh;
use std::str::FromStr;

/// The supported recurrent cell families.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum CellType {
    Lstm,
    Gru,
    BasicRnn,
}

impl FromStr for CellType {
    type Err = crate::Error;

    /// Accepts the external spellings `"LSTM"`, `"GRU"` and `"BasicRNN"`;
    /// anything else is a configuration error, not a process abort.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LSTM" => Ok(CellType::Lstm),
            "GRU" => Ok(CellType::Gru),
            "BasicRNN" => Ok(CellType::BasicRnn),
            other => Err(crate::Error::UnknownCellType(other.to_owned())),
        }
    }
}

/// Single-gate tanh recurrence, `h_t = tanh(x_t · W_ih + h_{t-1} · W_hh + b)`.
///
/// The engine ships LSTM and GRU cells but no plain RNN cell, so this one
/// is built by hand.
#[derive(Module, Debug)]
pub struct BasicRnn<B: Backend> {
    /// # Shape
    /// [d_input, d_hidden]
    pub weight_ih: Param<Tensor<B, 2>>,
    /// # Shape
    /// [d_hidden, d_hidden]
    pub weight_hh: Param<Tensor<B, 2>>,
    /// # Shape
    /// [d_hidden]
    pub bias: Param<Tensor<B, 1>>,
}

#[derive(Config, Debug)]
pub struct BasicRnnConfig {
    pub d_input: usize,
    pub d_hidden: usize,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl BasicRnnConfig {
    /// Returns the initialized cell.
    pub fn init<B: Backend>(&self, device: &B::Device) -> BasicRnn<B> {
        BasicRnn {
            weight_ih: self.initializer.init_with(
                [self.d_input, self.d_hidden],
                Some(self.d_input),
                Some(self.d_hidden),
                device,
            ),
            weight_hh: self.initializer.init_with(
                [self.d_hidden, self.d_hidden],
                Some(self.d_hidden),
                Some(self.d_hidden),
                device,
            ),
            bias: Initializer::Zeros.init([self.d_hidden], device),
        }
    }
}

impl<B: Backend> BasicRnn<B> {
    /// Run the recurrence from a zero state over the whole sequence.
    ///
    /// # Shapes
    ///   - Input [batch, seq_len, d_input]
    ///   - Output [batch, seq_len, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, _seq_len, d_input] = x.dims();
        let [_, d_hidden] = self.weight_hh.dims();
        let device = x.device();

        let mut state = Tensor::zeros([batch, d_hidden], &device);
        let mut outputs: Vec<Tensor<B, 3>> = Vec::new();
        for step in x.iter_dim(1) {
            let input = step.reshape([batch, d_input]);
            state = tanh(
                input.matmul(self.weight_ih.val())
                    + state.matmul(self.weight_hh.val())
                    + self.bias.val().unsqueeze(),
            );
            outputs.push(state.clone().reshape([batch, 1, d_hidden]));
        }
        Tensor::cat(outputs, 1)
    }
}

/// A recurrent layer polymorphic over the cell family, uniformly exposing
/// every timestep's hidden state.
#[derive(Module, Debug)]
pub enum RecurrentCell<B: Backend> {
    Lstm(Lstm<B>),
    Gru(Gru<B>),
    BasicRnn(BasicRnn<B>),
}

#[derive(Config, Debug)]
pub struct RecurrentCellConfig {
    pub cell: CellType,
    pub d_input: usize,
    pub d_hidden: usize,
}

impl RecurrentCellConfig {
    /// Returns the initialized cell.
    pub fn init<B: Backend>(&self, device: &B::Device) -> RecurrentCell<B> {
        match self.cell {
            CellType::Lstm => {
                // uniform ±1/√d_input, the classic LSTM range
                let bound = 1.0 / (self.d_input as f64).sqrt();
                RecurrentCell::Lstm(
                    LstmConfig::new(self.d_input, self.d_hidden, true)
                        .with_initializer(Initializer::Uniform {
                            min: -bound,
                            max: bound,
                        })
                        .init(device),
                )
            }
            CellType::Gru => {
                RecurrentCell::Gru(GruConfig::new(self.d_input, self.d_hidden, true).init(device))
            }
            CellType::BasicRnn => RecurrentCell::BasicRnn(
                BasicRnnConfig::new(self.d_input, self.d_hidden).init(device),
            ),
        }
    }
}

impl<B: Backend> RecurrentCell<B> {
    /// # Shapes
    ///   - Input [batch, seq_len, d_input]
    ///   - Output [batch, seq_len, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            RecurrentCell::Lstm(lstm) => lstm.forward(x, None).0,
            RecurrentCell::Gru(gru) => gru.forward(x, None),
            RecurrentCell::BasicRnn(cell) => cell.forward(x),
        }
    }
}

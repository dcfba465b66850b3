//! The benchmarked network: three dense layers with an activation
//! between the second hidden layer and the output layer.
//!
//! ```text
//! out = act((x·h1 + b1)·h2 + b2)·out_w + out_b
//! ```
//!
//! The output layer is affine, so predictions are unbounded scores.

use log::debug;
use rand::Rng;
use serde::{ Serialize, Deserialize, de::DeserializeOwned };

use crate::{
  Tensor,
  scalar::{ Inner, Real },
  ops::{ NumericOps, RealOps },
  error::{ ModelError, ModelResult },
};


/// Non-linearity applied to the second hidden layer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
  #[default]
  Sigmoid,
  Relu,
  Identity,
}

impl Activation {
  pub fn apply<T: Real>(&self, x: &Tensor<T>) -> Tensor<T> {
    match self {
      Self::Sigmoid => x.sigmoid(),
      Self::Relu => x.relu(),
      Self::Identity => x.clone(),
    }
  }
}


/// Layer widths of the network.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
  /// Features per input row (28 * 28 pixels).
  pub num_input: usize,
  pub n_hidden_1: usize,
  pub n_hidden_2: usize,
  pub num_classes: usize,
  pub activation: Activation,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      num_input: 784,
      n_hidden_1: 256,
      n_hidden_2: 256,
      num_classes: 10,
      activation: Activation::Sigmoid,
    }
  }
}

impl ModelConfig {
  pub fn validate(&self) -> ModelResult<()> {
    let widths = [
      ("num_input", self.num_input),
      ("n_hidden_1", self.n_hidden_1),
      ("n_hidden_2", self.n_hidden_2),
      ("num_classes", self.num_classes),
    ];
    match widths.iter().find(|(_, n)| *n == 0 ) {
      Some((name, _)) => Err(ModelError::InvalidConfig { reason: format!("{name} must be positive") }),
      None => Ok(()),
    }
  }
}


/// Fully connected layer computing `x·weights + bias`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer<T: Inner> {
  weights: Tensor<T>,
  bias: Tensor<T>,
}

impl<T: Real> DenseLayer<T> {
  pub fn new(weights: Tensor<T>, bias: Tensor<T>) -> ModelResult<Self> {
    let layer = Self { weights, bias };
    layer.check()?;
    Ok(layer)
  }

  /// Weights and bias drawn from a standard normal distribution.

  pub fn random<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
    Self {
      weights: Tensor::randn(&[input_size, output_size], rng),
      bias: Tensor::randn(&[output_size], rng),
    }
  }

  fn check(&self) -> ModelResult<()> {
    let well_formed = self.weights.is_dense() && self.bias.is_dense() &&
      self.weights.rank() == 2 && self.bias.rank() == 1 &&
      self.weights.dims()[1] == self.bias.dims()[0];
    if well_formed {
      Ok(())
    } else {
      Err(ModelError::LayerShape {
        weights: self.weights.dims().to_vec(),
        bias: self.bias.dims().to_vec(),
      })
    }
  }

  pub fn run(&self, input: &Tensor<T>) -> Tensor<T> {
    input.mm(&self.weights) + &self.bias
  }

  pub fn input_size(&self) -> usize {
    self.weights.dims()[0]
  }

  pub fn output_size(&self) -> usize {
    self.weights.dims()[1]
  }

  pub fn weights(&self) -> &Tensor<T> {
    &self.weights
  }

  pub fn bias(&self) -> &Tensor<T> {
    &self.bias
  }
}


/// All parameters of the network together with the configuration
/// they were built for.
///
/// Parameters never change after construction. Every call to
/// [forward](ModelParams::forward) is a pure function of the
/// parameters and its input.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams<T: Inner = f32> {
  config: ModelConfig,
  hidden_1: DenseLayer<T>,
  hidden_2: DenseLayer<T>,
  output: DenseLayer<T>,
}

impl<T: Real> ModelParams<T> {
  /// Draw fresh parameters for `config`.

  pub fn init<R: Rng>(config: &ModelConfig, rng: &mut R) -> ModelResult<Self> {
    config.validate()?;
    let hidden_1 = DenseLayer::random(config.num_input, config.n_hidden_1, rng);
    let hidden_2 = DenseLayer::random(config.n_hidden_1, config.n_hidden_2, rng);
    let output = DenseLayer::random(config.n_hidden_2, config.num_classes, rng);
    let params = Self::from_layers(config.clone(), hidden_1, hidden_2, output)?;
    debug!("Initialized {} parameters for {:?}", params.num_parameters(), config);
    Ok(params)
  }

  pub fn from_layers(
    config: ModelConfig,
    hidden_1: DenseLayer<T>,
    hidden_2: DenseLayer<T>,
    output: DenseLayer<T>,
  ) -> ModelResult<Self> {
    let params = Self { config, hidden_1, hidden_2, output };
    params.validate()?;
    Ok(params)
  }

  fn validate(&self) -> ModelResult<()> {
    self.config.validate()?;
    let c = &self.config;
    let layers = [
      ("h1", &self.hidden_1, [c.num_input, c.n_hidden_1]),
      ("h2", &self.hidden_2, [c.n_hidden_1, c.n_hidden_2]),
      ("out", &self.output, [c.n_hidden_2, c.num_classes]),
    ];
    for (layer, dense, expected) in layers {
      dense.check()?;
      let actual = [dense.input_size(), dense.output_size()];
      if actual != expected {
        return Err(ModelError::LayerMismatch { layer, expected, actual })
      }
    }
    Ok(())
  }

  pub fn config(&self) -> &ModelConfig {
    &self.config
  }

  pub fn num_parameters(&self) -> usize {
    [&self.hidden_1, &self.hidden_2, &self.output].iter()
      .map(|layer| layer.weights.size() + layer.bias.size() )
      .sum()
  }

  /// Uniform `[batch, num_input]` input in `[0, 1)`.

  pub fn sample_input<R: Rng>(&self, batch: usize, rng: &mut R) -> Tensor<T> {
    Tensor::rand(&[batch, self.config.num_input], rng)
  }

  pub fn forward(&self, input: &Tensor<T>) -> ModelResult<Tensor<T>> {
    if input.rank() != 2 || input.dims()[1] != self.config.num_input {
      return Err(ModelError::InputShape {
        expected: self.config.num_input,
        actual: input.dims().to_vec(),
      })
    }
    let layer_1 = self.hidden_1.run(input);
    let layer_2 = self.hidden_2.run(&layer_1);
    let activated = self.config.activation.apply(&layer_2);
    Ok(self.output.run(&activated))
  }
}

impl<T: Real + Serialize + DeserializeOwned> ModelParams<T> {
  /// Encode all parameters and the config with postcard.

  pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
    Ok(postcard::to_allocvec(self)?)
  }

  pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
    let params: Self = postcard::from_bytes(bytes)?;
    params.validate()?;
    Ok(params)
  }
}

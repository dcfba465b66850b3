//! Error types for model construction, inference and benchmark runs.

use thiserror::Error;

/// Errors raised while building or evaluating a model.
#[derive(Error, Debug)]
pub enum ModelError {
  #[error("Invalid model configuration: {reason}")]
  InvalidConfig { reason: String },

  #[error("Dense layer needs [in, out] weights and [out] bias, got {weights:?} and {bias:?}")]
  LayerShape {
    weights: Vec<usize>,
    bias: Vec<usize>,
  },

  #[error("Layer '{layer}' has shape {actual:?}, expected {expected:?}")]
  LayerMismatch {
    layer: &'static str,
    expected: [usize; 2],
    actual: [usize; 2],
  },

  #[error("Input must be a [batch, {expected}] matrix, got {actual:?}")]
  InputShape { expected: usize, actual: Vec<usize> },

  #[error("Parameter snapshot failed: {0}")]
  Snapshot(#[from] postcard::Error),
}

/// Errors that abort a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
  #[error("Benchmark needs at least one iteration")]
  EmptyRun,

  #[error("Forward pass failed: {0}")]
  Model(#[from] ModelError),
}

pub type ModelResult<T> = Result<T, ModelError>;
pub type BenchResult<T> = Result<T, BenchError>;

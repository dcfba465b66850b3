//! Forward-pass inference microbenchmark for a small multi layer perceptron.
//!
//! A 784 → 256 → 256 → 10 network is evaluated eagerly on a single fixed
//! input, over and over, and the average cost of one pass is reported.
//!
//! # Features
//!
//! - **Eager tensors** — Reference counted, immutable storage with
//! broadcasting views. Bias vectors are added to batches without copies.
//!
//! - **Explicit parameters** — A [ModelConfig] goes into
//! [ModelParams::init] and everything needed for inference comes back out.
//! No global state.
//!
//! - **Snapshots** — Parameters can be encoded with `postcard` and loaded
//! again, shapes re-validated on the way in.
//!
//! # Examples
//!
//! ```
//! use mlp_bench::{ bench, ModelConfig, ModelParams };
//!
//! let mut rng = mlp_bench::make_rng(Some(42));
//! let model = ModelParams::<f32>::init(&ModelConfig::default(), &mut rng).unwrap();
//! let input = model.sample_input(1, &mut rng);
//!
//! let report = bench::run(100, || model.forward(&input) ).unwrap();
//! println!("{}", report);
//! ```
//!
//! # Optional features
//!
//! - `unsafe` *(default)* — Accelerated matrix math using the `matrixmultiply` crate.

mod internal;
mod shape;
mod tensor;

pub mod ops;
pub mod scalar;
pub mod error;
pub mod model;
pub mod bench;

pub use shape::Shape;
pub use tensor::Tensor;
pub use internal::make_rng;
pub use model::{ Activation, ModelConfig, DenseLayer, ModelParams };
pub use bench::{ BenchConfig, BenchReport };
pub use error::{ ModelError, BenchError };

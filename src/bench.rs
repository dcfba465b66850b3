//! Timing harness for repeated forward passes.

use std::hint::black_box;
use std::time::Instant;

use log::{ debug, info, log_enabled, Level };
use serde::{ Serialize, Deserialize };

use crate::{
  internal::make_rng,
  model::{ ModelConfig, ModelParams },
  error::{ BenchError, BenchResult, ModelResult },
};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
  /// Forward passes per run.
  pub count: usize,
  /// Fixed seed for parameter and input initialization.
  /// Unseeded runs draw from OS entropy.
  pub seed: Option<u64>,
}

impl Default for BenchConfig {
  fn default() -> Self {
    Self {
      count: 200_000,
      seed: None,
    }
  }
}


/// Wall-clock timer with millisecond resolution.

pub struct Stopwatch {
  start: Instant,
}

impl Stopwatch {
  pub fn start() -> Self {
    Self { start: Instant::now() }
  }

  /// Whole milliseconds since [start](Stopwatch::start), truncated.

  pub fn elapsed_ms(&self) -> u64 {
    self.start.elapsed().as_millis() as u64
  }
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
  pub count: usize,
  pub duration_ms: u64,
  pub ns_per_iter: f64,
}

impl std::fmt::Display for BenchReport {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    // Debug formatting keeps the fractional part of whole numbers (200000.0)
    write!(f, "ns_per_iter: {:?}", self.ns_per_iter)
  }
}


/// Milliseconds per million iterations.
///
/// One millisecond per million iterations is one nanosecond per iteration,
/// so the figure reads as ns/iter. Its resolution is bounded by the whole
/// millisecond `duration_ms`, which makes very short runs report zero.

pub fn ns_per_iter(duration_ms: u64, count: usize) -> f64 {
  duration_ms as f64 / (count as f64 / 1_000_000.0)
}


/// Call `step` exactly `count` times and time the whole loop.
///
/// The first error ends the run.

pub fn run<O, F>(count: usize, mut step: F) -> BenchResult<BenchReport>
where
  F: FnMut() -> ModelResult<O>,
{
  if count == 0 { return Err(BenchError::EmptyRun) }
  info!("Timing {} forward passes", count);

  let stopwatch = Stopwatch::start();
  for _ in 0..count {
    black_box(step()?);
  }
  let duration_ms = stopwatch.elapsed_ms();

  let report = BenchReport { count, duration_ms, ns_per_iter: ns_per_iter(duration_ms, count) };
  debug!("Finished in {} ms: {:?}", duration_ms, report);
  Ok(report)
}


/// Build a model for `model`, draw a single `[1, num_input]` input and
/// time `bench.count` forward passes on it.

pub fn execute(model: &ModelConfig, bench: &BenchConfig) -> BenchResult<BenchReport> {
  let mut rng = make_rng(bench.seed);
  let params = ModelParams::<f32>::init(model, &mut rng)?;
  let input = params.sample_input(1, &mut rng);
  info!("Model ready: {} parameters", params.num_parameters());
  if log_enabled!(Level::Debug) {
    debug!("Sample prediction: {}", params.forward(&input)?);
  }
  run(bench.count, || params.forward(&input) )
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ModelError;

  #[test]
  fn normalization() {
    assert_eq!(ns_per_iter(40_000, 200_000), 200_000.0);
    assert_eq!(ns_per_iter(40_000, 200_000), 40_000.0 / 0.2);
    assert_eq!(ns_per_iter(0, 200_000), 0.0);
    assert_eq!(ns_per_iter(1, 1_000_000), 1.0);
  }

  #[test]
  fn exact_call_count() {
    let mut calls = 0;
    let report = run(1000, || -> ModelResult<()> {
      calls += 1;
      Ok(())
    }).unwrap();
    assert_eq!(calls, 1000);
    assert_eq!(report.count, 1000);
  }

  #[test]
  fn stops_at_first_error() {
    let mut calls = 0;
    let result = run(10, || {
      calls += 1;
      if calls == 3 {
        Err(ModelError::InputShape { expected: 784, actual: vec![1] })
      } else {
        Ok(calls)
      }
    });
    assert!(matches!(result, Err(BenchError::Model(ModelError::InputShape { .. }))));
    assert_eq!(calls, 3);
  }

  #[test]
  fn empty_run() {
    let result = run(0, || -> ModelResult<()> { Ok(()) });
    assert!(matches!(result, Err(BenchError::EmptyRun)));
  }

  #[test]
  fn report_format() {
    let report = BenchReport { count: 200_000, duration_ms: 40_000, ns_per_iter: ns_per_iter(40_000, 200_000) };
    assert_eq!(report.to_string(), "ns_per_iter: 200000.0");
    let report = BenchReport { count: 3, duration_ms: 1, ns_per_iter: 2.5 };
    assert_eq!(report.to_string(), "ns_per_iter: 2.5");
  }

  #[test]
  fn stopwatch_millis() {
    let stopwatch = Stopwatch::start();
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(stopwatch.elapsed_ms() >= 5);
  }

  #[test]
  fn execute_small_model() {
    let model = ModelConfig { num_input: 8, n_hidden_1: 4, n_hidden_2: 4, num_classes: 2, ..Default::default() };
    let bench = BenchConfig { count: 50, seed: Some(11) };
    let report = execute(&model, &bench).unwrap();
    assert_eq!(report.count, 50);
    assert_eq!(report.ns_per_iter, ns_per_iter(report.duration_ms, 50));
  }

  #[test]
  fn execute_rejects_bad_config() {
    let model = ModelConfig { num_classes: 0, ..Default::default() };
    let result = execute(&model, &BenchConfig { count: 1, seed: Some(1) });
    assert!(matches!(result, Err(BenchError::Model(ModelError::InvalidConfig { .. }))));
  }

  #[test]
  fn default_config() {
    let config = BenchConfig::default();
    assert_eq!(config.count, 200_000);
    assert_eq!(config.seed, None);
  }
}

//! Times 200,000 forward passes of the default network and prints
//! `ns_per_iter: <value>`. Set `RUST_LOG=info` for progress on stderr.

use log::error;
use mlp_bench::{ bench, BenchConfig, ModelConfig };

fn main() {
  env_logger::init();

  match bench::execute(&ModelConfig::default(), &BenchConfig::default()) {
    Ok(report) => println!("{}", report),
    Err(e) => {
      error!("Benchmark failed: {}", e);
      std::process::exit(1);
    }
  }
}

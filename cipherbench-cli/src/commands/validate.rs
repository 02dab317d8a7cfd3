// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cipherbench validate` command - Validate configuration file.

use std::path::Path;

use cipherbench_core::ConfigLoader;

pub async fn execute(file: &Path) -> anyhow::Result<()> {
    tracing::info!(file = %file.display(), "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            let bench = &config.benchmark;
            println!("✓ Configuration is valid");
            println!();
            println!("Benchmark Settings:");
            println!("  Iterations per run:   {}", bench.total_iterations);
            println!("  Tries:                {}", bench.try_count);
            println!("  Output Directory:     {}", bench.output_dir.display());
            println!("  Verify Round Trip:    {}", bench.verify);
            println!("  Failure Budget:       {} consecutive", bench.max_consecutive_failures);
            println!("  Iteration Timeout:    {}ms", bench.iteration_timeout.as_millis());
            println!();
            println!("Sampler Settings:");
            println!(
                "  Sampling Interval:    {}ms",
                config.sampler.sampling_interval.as_millis()
            );
            println!("  CPU Retries:          {}", config.sampler.cpu_retries);
            println!("  CPU Fallback:         {}%", config.sampler.cpu_fallback_percent);
            println!();
            println!("Store Root:             {}", config.store.root.display());
            match config.metrics.port {
                Some(port) => println!("Metrics Port:           {}", port),
                None => println!("Metrics Port:           disabled"),
            }
            println!();
            println!("Algorithms ({}):", config.sweep.algorithms.len());
            for algorithm in &config.sweep.algorithms {
                println!("  - {}", algorithm);
            }
            println!("Labels ({}):", config.sweep.labels.len());
            for label in &config.sweep.labels {
                println!("  - {}", label);
            }
            println!();
            println!(
                "Total runs: {}",
                config.sweep.algorithms.len() * config.sweep.labels.len() * bench.try_count as usize
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cipherbench run` command - Execute the benchmark sweep.
//!
//! Loads and validates the configuration, opens the file store, optionally
//! starts the metrics endpoint, and runs the sweep on a blocking thread.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use cipherbench_benchmark::{MetricsExporter, RunOutcome, StageSummary, SweepDriver, SweepReport};
use cipherbench_core::{ConfigLoader, FileStore, IterationCount};

use crate::metrics;

pub async fn execute(
    config_path: &Path,
    metrics_port: Option<u16>,
    iterations: Option<u64>,
    hold: bool,
) -> anyhow::Result<()> {
    tracing::info!(config = %config_path.display(), "Starting benchmark sweep");

    // Load and validate configuration - fail fast on invalid config
    let mut config = ConfigLoader::load_file(config_path)?;
    if let Some(count) = iterations {
        config.benchmark.total_iterations = IterationCount::new(count)?;
    }

    let store = FileStore::open(&config.store.root)
        .with_context(|| format!("Cannot open store at {}", config.store.root.display()))?;
    let exporter = MetricsExporter::new().context("Cannot create metrics registry")?;

    let port = match metrics_port.or(config.metrics.port) {
        Some(0) => bail!("Metrics port must be non-zero"),
        other => other,
    };
    if let Some(port) = port {
        metrics::start_metrics_server(port, exporter.clone());
    }

    let (report, report_path) = tokio::task::spawn_blocking(move || {
        SweepDriver::from_config(&config, Arc::new(store), exporter).run_and_save()
    })
    .await
    .context("Sweep thread panicked")??;

    print_summary(&report);
    println!();
    println!("Report written to {}", report_path.display());

    if let (true, Some(port)) = (hold, port) {
        println!();
        println!("Serving metrics on port {}. Press Ctrl+C to stop...", port);
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down metrics server");
    }

    if report.failed() > 0 {
        bail!("{} of {} runs failed", report.failed(), report.runs.len());
    }
    Ok(())
}

pub(crate) fn print_summary(report: &SweepReport) {
    println!();
    println!("╔═════╦════════════════════╦══════════════════╦═══════════╦══════════════╦════════════╗");
    println!("║ Try ║ Algorithm          ║ Label            ║ Status    ║ Mean Encrypt ║ Mean Decr. ║");
    println!("╠═════╬════════════════════╬══════════════════╬═══════════╬══════════════╬════════════╣");

    for run in &report.runs {
        let status = match &run.outcome {
            RunOutcome::Completed => "ok",
            RunOutcome::Empty { .. } => "no data",
            RunOutcome::Failed { .. } => "FAILED",
        };
        let mean = |summary: &Option<StageSummary>| {
            summary
                .as_ref()
                .filter(|s| s.records > 0)
                .map(|s| format!("{:.3}ms", s.duration.mean_sec * 1000.0))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "║ {:<3} ║ {:<18} ║ {:<16} ║ {:<9} ║ {:>12} ║ {:>10} ║",
            run.try_number,
            run.algorithm.as_str(),
            run.label.as_str(),
            status,
            mean(&run.encryption),
            mean(&run.decryption)
        );
    }

    println!("╚═════╩════════════════════╩══════════════════╩═══════════╩══════════════╩════════════╝");

    for run in &report.runs {
        if let RunOutcome::Failed {
            stage,
            kind,
            message,
        } = &run.outcome
        {
            println!(
                "  ✗ {} / {} (try {}) failed at {} [{}]: {}",
                run.algorithm, run.label, run.try_number, stage, kind, message
            );
        }
    }

    println!();
    println!(
        "Total: {} run(s), {} completed, {} failed",
        report.runs.len(),
        report.completed(),
        report.failed()
    );
}

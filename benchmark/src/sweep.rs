// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sweep driver.
//!
//! Runs `try_count` repetitions over the algorithm × label matrix. Plugins
//! are resolved once up front; each (try, algorithm, label) gets its own CSV
//! file. One pair's failure never aborts the sweep.

use std::path::PathBuf;
use std::sync::Arc;

use cipherbench_core::{
    AlgorithmId, BenchError, BenchmarkConfig, Config, KeyStore, Label, PayloadStore,
    PipelineState, PluginRegistry, SweepConfig, TransformPlugin,
};

use crate::exporter::MetricsExporter;
use crate::metrics::FailureKind;
use crate::orchestrator::{PipelineOrchestrator, PipelineRun, RunSettings};
use crate::report::{RunOutcome, RunReport, SweepReport};
use crate::reporter::{JsonReporter, ReporterError};
use crate::sampler::{Sampler, SysinfoProvider, SystemMetricsProvider};
use crate::sink::{csv_file_name, CsvSink};

/// Drives a full sweep and collects its reports.
pub struct SweepDriver<P> {
    benchmark: BenchmarkConfig,
    sweep: SweepConfig,
    registry: PluginRegistry,
    keys: KeyStore,
    store: Arc<dyn PayloadStore>,
    exporter: MetricsExporter,
    sampler: Sampler<P>,
}

impl SweepDriver<SysinfoProvider> {
    /// Driver over the live system with built-in plugins and fresh keys.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn PayloadStore>,
        exporter: MetricsExporter,
    ) -> Self {
        Self::new(
            config.benchmark.clone(),
            config.sweep.clone(),
            store,
            exporter,
            Sampler::system(config.sampler),
        )
    }
}

impl<P: SystemMetricsProvider> SweepDriver<P> {
    pub fn new(
        benchmark: BenchmarkConfig,
        sweep: SweepConfig,
        store: Arc<dyn PayloadStore>,
        exporter: MetricsExporter,
        sampler: Sampler<P>,
    ) -> Self {
        Self {
            benchmark,
            sweep,
            registry: PluginRegistry::with_builtin(),
            keys: KeyStore::generate(),
            store,
            exporter,
            sampler,
        }
    }

    /// Replace the plugin registry.
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the key store.
    pub fn with_keys(mut self, keys: KeyStore) -> Self {
        self.keys = keys;
        self
    }

    pub fn exporter(&self) -> &MetricsExporter {
        &self.exporter
    }

    /// Execute every (try, algorithm, label) run.
    pub fn run(&mut self) -> SweepReport {
        let mut report = SweepReport::new();
        let plugins = self.resolve_plugins();
        let settings = RunSettings::from(&self.benchmark);
        let total_iterations = self.benchmark.total_iterations;

        tracing::info!(
            algorithms = self.sweep.algorithms.len(),
            labels = self.sweep.labels.len(),
            tries = self.benchmark.try_count,
            iterations = total_iterations.get(),
            "Starting sweep"
        );

        for try_number in 1..=self.benchmark.try_count {
            for (algorithm, plugin) in &plugins {
                for label in &self.sweep.labels {
                    let plugin = match plugin {
                        Ok(plugin) => Arc::clone(plugin),
                        Err((kind, message)) => {
                            self.exporter.record_failure(label);
                            report.add_run(failed_report(
                                *algorithm,
                                label,
                                try_number,
                                total_iterations.get(),
                                PipelineState::Init,
                                *kind,
                                message.clone(),
                            ));
                            continue;
                        }
                    };

                    let csv_path = self.benchmark.output_dir.join(csv_file_name(
                        *algorithm,
                        label,
                        try_number,
                        total_iterations.get(),
                    ));
                    let mut sink = match CsvSink::open(&csv_path) {
                        Ok(sink) => sink,
                        Err(e) => {
                            tracing::error!(
                                algorithm = %algorithm,
                                label = %label,
                                path = %csv_path.display(),
                                "Cannot open result file: {}",
                                e
                            );
                            self.exporter.record_failure(label);
                            report.add_run(failed_report(
                                *algorithm,
                                label,
                                try_number,
                                total_iterations.get(),
                                PipelineState::Init,
                                FailureKind::Sink,
                                e.to_string(),
                            ));
                            continue;
                        }
                    };

                    let run = PipelineRun {
                        plugin,
                        label: label.clone(),
                        total_iterations,
                        try_number,
                    };
                    let mut run_report = PipelineOrchestrator::new(
                        settings,
                        self.store.as_ref(),
                        &mut self.sampler,
                        &self.exporter,
                    )
                    .run(&run, &mut sink);
                    run_report.csv_path = Some(csv_path);
                    report.add_run(run_report);
                }
            }
        }

        tracing::info!(
            runs = report.runs.len(),
            completed = report.completed(),
            failed = report.failed(),
            "Sweep finished"
        );
        report
    }

    /// Run the sweep and write its JSON report into the output directory.
    pub fn run_and_save(&mut self) -> Result<(SweepReport, PathBuf), ReporterError> {
        let report = self.run();
        let path = JsonReporter::new(&self.benchmark.output_dir)?.save(&report)?;
        Ok((report, path))
    }

    #[allow(clippy::type_complexity)]
    fn resolve_plugins(
        &self,
    ) -> Vec<(AlgorithmId, Result<Arc<dyn TransformPlugin>, (FailureKind, String)>)> {
        self.sweep
            .algorithms
            .iter()
            .map(|&algorithm| {
                let plugin = self.registry.resolve(algorithm, &self.keys).map_err(|e| {
                    tracing::error!(algorithm = %algorithm, "Cannot resolve plugin: {}", e);
                    (resolve_failure_kind(&e), e.to_string())
                });
                (algorithm, plugin)
            })
            .collect()
    }
}

/// Plugins that cannot be built are reported as key failures unless the
/// constructor said otherwise.
fn resolve_failure_kind(err: &BenchError) -> FailureKind {
    match err {
        BenchError::Transform(e) => FailureKind::from(e),
        BenchError::Store(e) => FailureKind::from(e),
        _ => FailureKind::KeyUnavailable,
    }
}

fn failed_report(
    algorithm: AlgorithmId,
    label: &Label,
    try_number: u32,
    total_iterations: u64,
    stage: PipelineState,
    kind: FailureKind,
    message: String,
) -> RunReport {
    RunReport {
        algorithm,
        label: label.clone(),
        try_number,
        total_iterations,
        outcome: RunOutcome::Failed {
            stage,
            kind,
            message,
        },
        encryption: None,
        decryption: None,
        csv_path: None,
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Pipeline orchestrator.
//!
//! Drives one (plugin, label) pair through the staged pipeline:
//! fetch the plaintext, run the measured forward loop, commit the last
//! artifact, then (when verifying) fetch it back, run the measured inverse
//! loop and commit the recovered plaintext.
//!
//! Failures never escape as errors: every run ends in a [`RunReport`].

use std::sync::Arc;
use std::time::Duration;

use cipherbench_core::{
    shannon_entropy, AlgorithmId, BenchmarkConfig, IterationCount, Label, Operation, PayloadStore,
    PipelineState, PipelineStateMachine, StateTransitionError, StoreError, TransformPlugin,
};

use crate::exporter::MetricsExporter;
use crate::metrics::{FailureKind, IterationFailure, SampleRecord};
use crate::report::{RunOutcome, RunReport, StageSummary};
use crate::sampler::{Sampler, SystemMetricsProvider};
use crate::sink::ResultSink;

/// Settings shared by every run of a sweep.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub max_consecutive_failures: u32,
    pub iteration_timeout: Duration,
    /// Run the inverse stage and compare against the source plaintext.
    pub verify: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from(&BenchmarkConfig::default())
    }
}

impl From<&BenchmarkConfig> for RunSettings {
    fn from(config: &BenchmarkConfig) -> Self {
        Self {
            max_consecutive_failures: config.max_consecutive_failures,
            iteration_timeout: config.iteration_timeout,
            verify: config.verify,
        }
    }
}

/// One (plugin, label) pair to drive through the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub plugin: Arc<dyn TransformPlugin>,
    pub label: Label,
    pub total_iterations: IterationCount,
    pub try_number: u32,
}

impl PipelineRun {
    pub fn algorithm(&self) -> AlgorithmId {
        self.plugin.algorithm()
    }
}

/// A failure that ends the run.
#[derive(Debug)]
struct StageFailure {
    stage: PipelineState,
    kind: FailureKind,
    message: String,
    /// Already counted in `operation_failures_total` per iteration.
    counted: bool,
}

impl StageFailure {
    fn new(stage: PipelineState, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            counted: false,
        }
    }

    fn store(stage: PipelineState, err: StoreError) -> Self {
        Self::new(stage, FailureKind::from(&err), err.to_string())
    }

    fn transition(stage: PipelineState, err: StateTransitionError) -> Self {
        Self::new(stage, FailureKind::InvalidTransition, err.to_string())
    }
}

/// Records and failures of one direction.
#[derive(Debug)]
struct StageLog {
    operation: Operation,
    records: Vec<SampleRecord>,
    failures: Vec<IterationFailure>,
    last_output: Option<Vec<u8>>,
    bytes_committed: Option<u64>,
}

impl StageLog {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            records: Vec::new(),
            failures: Vec::new(),
            last_output: None,
            bytes_committed: None,
        }
    }

    fn summary(self) -> StageSummary {
        StageSummary::from_parts(
            self.operation,
            &self.records,
            self.failures,
            self.bytes_committed,
        )
    }
}

/// Drives pipeline runs against a store, a sampler and an exporter.
pub struct PipelineOrchestrator<'a, P> {
    settings: RunSettings,
    store: &'a dyn PayloadStore,
    sampler: &'a mut Sampler<P>,
    exporter: &'a MetricsExporter,
}

impl<'a, P: SystemMetricsProvider> PipelineOrchestrator<'a, P> {
    pub fn new(
        settings: RunSettings,
        store: &'a dyn PayloadStore,
        sampler: &'a mut Sampler<P>,
        exporter: &'a MetricsExporter,
    ) -> Self {
        Self {
            settings,
            store,
            sampler,
            exporter,
        }
    }

    /// Execute one run, appending every record to `sink`.
    pub fn run(&mut self, run: &PipelineRun, sink: &mut dyn ResultSink) -> RunReport {
        let algorithm = run.algorithm();
        let mut sm = PipelineStateMachine::new(format!("{}/{}", algorithm, run.label));
        let mut forward = StageLog::new(Operation::Encryption);
        let mut inverse = StageLog::new(Operation::Decryption);

        tracing::info!(
            algorithm = %algorithm,
            label = %run.label,
            iterations = run.total_iterations.get(),
            try_number = run.try_number,
            "Starting pipeline run"
        );

        let outcome = match self.execute(&mut sm, run, sink, &mut forward, &mut inverse) {
            Ok(outcome) => outcome,
            Err(failure) => {
                let time_in_stage = sm.time_in_current_state();
                sm.fail();
                if !failure.counted {
                    self.exporter.record_failure(&run.label);
                }
                tracing::error!(
                    run = sm.run(),
                    stage = %failure.stage,
                    kind = %failure.kind,
                    time_in_stage_ms = time_in_stage.as_millis() as u64,
                    "Pipeline run failed: {}",
                    failure.message
                );
                RunOutcome::Failed {
                    stage: failure.stage,
                    kind: failure.kind,
                    message: failure.message,
                }
            }
        };

        if outcome.is_completed() {
            tracing::info!(
                algorithm = %algorithm,
                label = %run.label,
                encrypted = forward.records.len(),
                decrypted = inverse.records.len(),
                "Pipeline run completed"
            );
        }

        let forward_ran = !forward.records.is_empty() || !forward.failures.is_empty();
        let inverse_ran = !inverse.records.is_empty() || !inverse.failures.is_empty();

        RunReport {
            algorithm,
            label: run.label.clone(),
            try_number: run.try_number,
            total_iterations: run.total_iterations.get(),
            outcome,
            encryption: forward_ran.then(|| forward.summary()),
            decryption: inverse_ran.then(|| inverse.summary()),
            csv_path: None,
        }
    }

    fn execute(
        &mut self,
        sm: &mut PipelineStateMachine,
        run: &PipelineRun,
        sink: &mut dyn ResultSink,
        forward: &mut StageLog,
        inverse: &mut StageLog,
    ) -> Result<RunOutcome, StageFailure> {
        let algorithm = run.algorithm();

        // Stage A
        advance(sm, PipelineState::FetchSource)?;
        let plaintext = match self.store.fetch_plaintext(&run.label) {
            Ok(Some(data)) => data,
            Ok(None) => return self.finish_empty(sm, run, PipelineState::FetchSource),
            Err(e) => return Err(StageFailure::store(PipelineState::FetchSource, e)),
        };

        self.run_loop(sm, run, &plaintext, sink, forward)?;

        // Stage B
        advance(sm, PipelineState::CommitArtifact)?;
        let artifact = take_last_output(forward, PipelineState::CommitArtifact)?;
        self.store
            .commit_artifact(algorithm, &run.label, &artifact)
            .map_err(|e| StageFailure::store(PipelineState::CommitArtifact, e))?;
        forward.bytes_committed = Some(artifact.len() as u64);

        if !self.settings.verify {
            advance(sm, PipelineState::Done)?;
            return Ok(RunOutcome::Completed);
        }

        advance(sm, PipelineState::FetchArtifact)?;
        let artifact = match self.store.fetch_artifact(algorithm, &run.label) {
            Ok(Some(data)) => data,
            Ok(None) => return self.finish_empty(sm, run, PipelineState::FetchArtifact),
            Err(e) => return Err(StageFailure::store(PipelineState::FetchArtifact, e)),
        };

        self.run_loop(sm, run, &artifact, sink, inverse)?;

        // Stage C
        advance(sm, PipelineState::CommitResult)?;
        let recovered = take_last_output(inverse, PipelineState::CommitResult)?;
        self.store
            .commit_result(algorithm, &run.label, &recovered)
            .map_err(|e| StageFailure::store(PipelineState::CommitResult, e))?;
        inverse.bytes_committed = Some(recovered.len() as u64);

        if recovered != plaintext {
            return Err(StageFailure::new(
                PipelineState::CommitResult,
                FailureKind::Integrity,
                format!(
                    "round trip mismatch: recovered {} bytes, expected {}",
                    recovered.len(),
                    plaintext.len()
                ),
            ));
        }

        advance(sm, PipelineState::Done)?;
        Ok(RunOutcome::Completed)
    }

    fn finish_empty(
        &self,
        sm: &mut PipelineStateMachine,
        run: &PipelineRun,
        stage: PipelineState,
    ) -> Result<RunOutcome, StageFailure> {
        tracing::warn!(
            algorithm = %run.algorithm(),
            label = %run.label,
            stage = %stage,
            "No data for label"
        );
        advance(sm, PipelineState::Done)?;
        Ok(RunOutcome::Empty { stage })
    }

    /// `total_iterations` sampled plugin calls in one direction.
    fn run_loop(
        &mut self,
        sm: &mut PipelineStateMachine,
        run: &PipelineRun,
        input: &[u8],
        sink: &mut dyn ResultSink,
        log: &mut StageLog,
    ) -> Result<(), StageFailure> {
        let operation = log.operation;
        let (measure_state, record_state) = match operation {
            Operation::Encryption => (PipelineState::MeasureTransform, PipelineState::RecordTransform),
            Operation::Decryption => (PipelineState::MeasureInverse, PipelineState::RecordInverse),
        };
        let plugin = &run.plugin;
        let mut consecutive_failures = 0u32;

        for iteration in 1..=run.total_iterations.get() {
            advance(sm, measure_state)?;
            let (result, measurement) = self.sampler.measure(|| match operation {
                Operation::Encryption => plugin.transform(input).map(|t| t.output),
                Operation::Decryption => plugin.inverse(input),
            });
            advance(sm, record_state)?;

            let result = match result {
                Ok(_) if measurement.duration > self.settings.iteration_timeout => Err((
                    FailureKind::Timeout,
                    format!(
                        "iteration took {:?}, limit {:?}",
                        measurement.duration, self.settings.iteration_timeout
                    ),
                )),
                Ok(output) => Ok(output),
                Err(e) => Err((FailureKind::from(&e), e.to_string())),
            };

            match result {
                Ok(output) => {
                    consecutive_failures = 0;
                    let entropy_bits_per_byte =
                        (operation == Operation::Encryption).then(|| shannon_entropy(&output));
                    let record = SampleRecord {
                        operation,
                        iteration,
                        label: run.label.clone(),
                        cpu_percent: measurement.cpu_percent,
                        memory_delta_mb: measurement.memory_delta_mb,
                        resident_mb: measurement.resident_mb,
                        duration_sec: measurement.duration.as_secs_f64(),
                        output_size_bytes: output.len() as u64,
                        entropy_bits_per_byte,
                    };

                    sink.append(&record).map_err(|e| {
                        StageFailure::new(record_state, FailureKind::Sink, e.to_string())
                    })?;
                    self.exporter.observe(&record);

                    tracing::debug!(
                        algorithm = %run.algorithm(),
                        label = %run.label,
                        operation = %operation,
                        iteration,
                        duration_sec = record.duration_sec,
                        cpu_percent = record.cpu_percent,
                        "Iteration recorded"
                    );
                    log.records.push(record);
                    log.last_output = Some(output);
                }
                Err((kind, message)) => {
                    consecutive_failures += 1;
                    self.exporter.record_failure(&run.label);
                    tracing::warn!(
                        algorithm = %run.algorithm(),
                        label = %run.label,
                        stage = %measure_state,
                        iteration,
                        kind = %kind,
                        "Iteration failed: {}",
                        message
                    );
                    let failure = IterationFailure {
                        operation,
                        iteration,
                        label: run.label.clone(),
                        kind,
                        message: message.clone(),
                    };
                    sink.append_failure(&failure).map_err(|e| {
                        StageFailure::new(record_state, FailureKind::Sink, e.to_string())
                    })?;
                    log.failures.push(failure);

                    if consecutive_failures >= self.settings.max_consecutive_failures {
                        return Err(StageFailure {
                            stage: measure_state,
                            kind,
                            message: format!(
                                "aborted after {} consecutive failures; last: {}",
                                consecutive_failures, message
                            ),
                            counted: true,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn advance(sm: &mut PipelineStateMachine, target: PipelineState) -> Result<(), StageFailure> {
    let from = sm.state();
    sm.transition_to(target)
        .map_err(|e| StageFailure::transition(from, e))
}

/// The loop's last successful output; a loop without one cannot commit.
fn take_last_output(log: &mut StageLog, stage: PipelineState) -> Result<Vec<u8>, StageFailure> {
    log.last_output.take().ok_or_else(|| {
        let (kind, message) = log
            .failures
            .last()
            .map(|f| (f.kind, f.message.clone()))
            .unwrap_or((FailureKind::Cipher, "no iterations ran".to_string()));
        StageFailure {
            stage,
            kind,
            message: format!("no successful {} to commit; last: {}", log.operation, message),
            counted: true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::{fast_config, ScriptedProvider};
    use crate::sink::{MemorySink, SinkError};
    use cipherbench_core::{KeyStore, MemoryStore, PluginRegistry, TransformError, TransformResult, Transformed};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn sampler() -> Sampler<ScriptedProvider> {
        Sampler::new(ScriptedProvider::new(&[], &[]), fast_config())
    }

    fn aes_run(label: &str, iterations: u64) -> PipelineRun {
        let keys = KeyStore::generate();
        let plugin = PluginRegistry::with_builtin()
            .resolve(AlgorithmId::AesGcm, &keys)
            .unwrap();
        PipelineRun {
            plugin,
            label: Label::new(label).unwrap(),
            total_iterations: IterationCount::new(iterations).unwrap(),
            try_number: 1,
        }
    }

    /// Fails every call whose 1-based index is listed.
    struct FlakyPlugin {
        calls: AtomicU64,
        failing: Vec<u64>,
    }

    impl TransformPlugin for FlakyPlugin {
        fn algorithm(&self) -> AlgorithmId {
            AlgorithmId::AesGcm
        }

        fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.contains(&call) {
                return Err(TransformError::Cipher {
                    algorithm: AlgorithmId::AesGcm,
                    reason: format!("call {}", call),
                });
            }
            let mut out = plaintext.to_vec();
            out.extend_from_slice(&call.to_be_bytes());
            Ok(Transformed::new(out))
        }

        fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
            Ok(artifact[..artifact.len() - 8].to_vec())
        }
    }

    fn flaky_run(failing: Vec<u64>, iterations: u64) -> PipelineRun {
        PipelineRun {
            plugin: Arc::new(FlakyPlugin {
                calls: AtomicU64::new(0),
                failing,
            }),
            label: Label::new("flaky").unwrap(),
            total_iterations: IterationCount::new(iterations).unwrap(),
            try_number: 1,
        }
    }

    #[test]
    fn test_completed_run_records_both_directions() {
        let store = MemoryStore::new();
        let run = aes_run("1KB file", 5);
        store.ingest_plaintext(&run.label, &[b'a'; 1024]).unwrap();

        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();
        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(sink.records().len(), 10);
        let encryption = report.encryption.unwrap();
        assert_eq!(encryption.records, 5);
        assert_eq!(encryption.bytes_committed, Some(1024 + 28));
        assert!(encryption.mean_entropy_bits_per_byte.unwrap() > 0.0);
        assert_eq!(report.decryption.unwrap().records, 5);
        assert_eq!(
            store.result(AlgorithmId::AesGcm, &run.label).unwrap(),
            vec![b'a'; 1024]
        );
        assert_eq!(exporter.operations(&run.label), 10);
    }

    #[test]
    fn test_iterations_numbered_from_one() {
        let store = MemoryStore::new();
        let run = aes_run("x", 4);
        store.ingest_plaintext(&run.label, b"abc").unwrap();

        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();
        let settings = RunSettings {
            verify: false,
            ..RunSettings::default()
        };
        let report =
            PipelineOrchestrator::new(settings, &store, &mut sampler, &exporter).run(&run, &mut sink);

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.decryption.is_none());
        let iterations: Vec<_> = sink.records().iter().map(|r| r.iteration).collect();
        assert_eq!(iterations, vec![1, 2, 3, 4]);
        assert!(sink
            .records()
            .iter()
            .all(|r| r.operation == Operation::Encryption && r.cpu_percent > 0.0));
    }

    #[test]
    fn test_missing_plaintext_is_empty() {
        let store = MemoryStore::new();
        let run = aes_run("absent", 3);
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();

        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert_eq!(
            report.outcome,
            RunOutcome::Empty {
                stage: PipelineState::FetchSource
            }
        );
        assert!(sink.records().is_empty());
        assert!(report.encryption.is_none());
        assert_eq!(exporter.failures(&run.label), 0);
    }

    #[test]
    fn test_isolated_failures_are_recorded_and_loop_continues() {
        let store = MemoryStore::new();
        let run = flaky_run(vec![2, 4], 5);
        store.ingest_plaintext(&run.label, b"payload").unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();
        let settings = RunSettings {
            verify: false,
            ..RunSettings::default()
        };

        let report =
            PipelineOrchestrator::new(settings, &store, &mut sampler, &exporter).run(&run, &mut sink);

        assert_eq!(report.outcome, RunOutcome::Completed);
        let encryption = report.encryption.unwrap();
        assert_eq!(encryption.records, 3);
        assert_eq!(encryption.attempted(), 5);
        let failed: Vec<_> = encryption.failures.iter().map(|f| f.iteration).collect();
        assert_eq!(failed, vec![2, 4]);
        assert_eq!(sink.failures(), encryption.failures.as_slice());
        assert_eq!(encryption.failures[0].kind, FailureKind::Cipher);
        assert_eq!(exporter.failures(&run.label), 2);

        // Last successful output is call 5.
        let mut expected = b"payload".to_vec();
        expected.extend_from_slice(&5u64.to_be_bytes());
        assert_eq!(
            store
                .fetch_artifact(AlgorithmId::AesGcm, &run.label)
                .unwrap()
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_consecutive_failures_abort_run() {
        let store = MemoryStore::new();
        let run = flaky_run(vec![2, 3, 4], 10);
        store.ingest_plaintext(&run.label, b"payload").unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();

        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed {
                stage: PipelineState::MeasureTransform,
                kind: FailureKind::Cipher,
                ..
            }
        ));
        let encryption = report.encryption.unwrap();
        assert_eq!(encryption.attempted(), 4);
        assert_eq!(sink.records().len(), 1);
        // The aborting failure reached the sink before the run ended.
        let persisted: Vec<_> = sink.failures().iter().map(|f| f.iteration).collect();
        assert_eq!(persisted, vec![2, 3, 4]);
        // Aborted runs commit nothing.
        assert_eq!(
            store.fetch_artifact(AlgorithmId::AesGcm, &run.label).unwrap(),
            None
        );
        assert_eq!(exporter.failures(&run.label), 3);
    }

    #[test]
    fn test_no_success_fails_at_commit() {
        let store = MemoryStore::new();
        let run = flaky_run(vec![1, 2], 2);
        store.ingest_plaintext(&run.label, b"payload").unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();

        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed {
                stage: PipelineState::CommitArtifact,
                kind: FailureKind::Cipher,
                ..
            }
        ));
    }

    #[test]
    fn test_slow_iterations_time_out() {
        let store = MemoryStore::new();
        let run = aes_run("slow", 2);
        store.ingest_plaintext(&run.label, b"abc").unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();
        let settings = RunSettings {
            iteration_timeout: Duration::ZERO,
            max_consecutive_failures: 5,
            verify: false,
        };

        let report =
            PipelineOrchestrator::new(settings, &store, &mut sampler, &exporter).run(&run, &mut sink);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed {
                stage: PipelineState::CommitArtifact,
                kind: FailureKind::Timeout,
                ..
            }
        ));
        assert!(sink.records().is_empty());
    }

    /// Accepts records, refuses failures.
    struct NoFailureFileSink(MemorySink);

    impl ResultSink for NoFailureFileSink {
        fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError> {
            self.0.append(record)
        }

        fn append_failure(&mut self, _failure: &IterationFailure) -> Result<(), SinkError> {
            Err(SinkError::Io {
                path: "failures.csv".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    #[test]
    fn test_unpersistable_failure_fails_run() {
        let store = MemoryStore::new();
        let run = flaky_run(vec![2], 5);
        store.ingest_plaintext(&run.label, b"payload").unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = NoFailureFileSink(MemorySink::new());

        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed {
                stage: PipelineState::RecordTransform,
                kind: FailureKind::Sink,
                ..
            }
        ));
        assert_eq!(sink.0.records().len(), 1);
    }

    #[test]
    fn test_non_utf8_plaintext_is_encoding_failure() {
        let store = MemoryStore::new();
        let run = aes_run("binary", 5);
        store.ingest_plaintext(&run.label, &[0xff, 0xfe, 0xfd]).unwrap();
        let exporter = MetricsExporter::new().unwrap();
        let mut sampler = sampler();
        let mut sink = MemorySink::new();

        let report = PipelineOrchestrator::new(RunSettings::default(), &store, &mut sampler, &exporter)
            .run(&run, &mut sink);

        assert!(matches!(
            report.outcome,
            RunOutcome::Failed {
                kind: FailureKind::Encoding,
                ..
            }
        ));
        assert_eq!(report.encryption.unwrap().failures.len(), 3);
    }
}

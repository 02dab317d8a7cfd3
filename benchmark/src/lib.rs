// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! cipherbench Benchmarking Framework
//!
//! Measures the cost of encryption algorithms over payloads of varying size.
//!
//! # Components
//!
//! - **Sampler**: CPU and memory readings around a single operation
//! - **Orchestrator**: drives one (plugin, label) pair through the staged pipeline
//! - **Sweep**: repeats runs over the algorithm × label matrix
//! - **Sinks**: one CSV row per iteration, appended and flushed immediately
//! - **Exporter**: prometheus counters, gauges and a duration histogram
//!
//! # Data Output
//!
//! Per-run CSV files plus a JSON sweep report with duration statistics.

pub mod exporter;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod reporter;
pub mod sampler;
pub mod sink;
pub mod sweep;

pub use exporter::MetricsExporter;
pub use metrics::{DurationSummary, FailureKind, IterationFailure, SampleRecord, SystemInfo};
pub use orchestrator::{PipelineOrchestrator, PipelineRun, RunSettings};
pub use report::{RunOutcome, RunReport, StageSummary, SweepReport};
pub use reporter::{JsonReporter, ReporterError};
pub use sampler::{Measurement, Sampler, SysinfoProvider, SystemMetricsProvider, Timer};
pub use sink::{
    csv_file_name, failures_path, CsvSink, MemorySink, ResultSink, SinkError, CSV_HEADER,
    FAILURE_CSV_HEADER,
};
pub use sweep::SweepDriver;

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Run and sweep reports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use cipherbench_core::{AlgorithmId, Label, Operation, PipelineState};
use serde::{Deserialize, Serialize};

use crate::metrics::{DurationSummary, FailureKind, IterationFailure, SampleRecord, SystemInfo};

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// A required row was absent; nothing was measured past `stage`.
    Empty { stage: PipelineState },
    Failed {
        stage: PipelineState,
        kind: FailureKind,
        message: String,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregate of one direction of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub operation: Operation,
    pub records: u64,
    pub failures: Vec<IterationFailure>,
    pub duration: DurationSummary,
    pub mean_cpu_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_entropy_bits_per_byte: Option<f64>,
    /// Size of the committed output, if the stage reached its commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_committed: Option<u64>,
}

impl StageSummary {
    /// Fold records and failures of one direction.
    pub fn from_parts(
        operation: Operation,
        records: &[SampleRecord],
        failures: Vec<IterationFailure>,
        bytes_committed: Option<u64>,
    ) -> Self {
        let count = records.len();
        let durations = records.iter().map(|r| r.duration_sec).collect();

        let mean_cpu_percent = if count == 0 {
            0.0
        } else {
            records.iter().map(|r| r.cpu_percent as f64).sum::<f64>() / count as f64
        };

        let entropies: Vec<f64> = records
            .iter()
            .filter_map(|r| r.entropy_bits_per_byte)
            .collect();
        let mean_entropy_bits_per_byte = (!entropies.is_empty())
            .then(|| entropies.iter().sum::<f64>() / entropies.len() as f64);

        Self {
            operation,
            records: count as u64,
            failures,
            duration: DurationSummary::from_samples(durations),
            mean_cpu_percent,
            mean_entropy_bits_per_byte,
            bytes_committed,
        }
    }

    /// Iterations attempted: records plus failures.
    pub fn attempted(&self) -> u64 {
        self.records + self.failures.len() as u64
    }
}

/// Result of one (try, algorithm, label) pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub algorithm: AlgorithmId,
    pub label: Label,
    pub try_number: u32,
    pub total_iterations: u64,
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<StageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decryption: Option<StageSummary>,
    /// CSV file the run's records were appended to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

/// Complete sweep report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Timestamp when the sweep started
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    pub runs: Vec<RunReport>,
}

impl SweepReport {
    /// Create a new, empty sweep report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "cipherbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            runs: Vec::new(),
        }
    }

    pub fn add_run(&mut self, run: RunReport) {
        self.runs.push(run);
    }

    pub fn completed(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_failed()).count()
    }
}

impl Default for SweepReport {
    fn default() -> Self {
        Self::new()
    }
}

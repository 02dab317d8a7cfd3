// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-iteration records and aggregate statistics.
//!
//! This module defines the data structures used to capture and serialize
//! benchmark measurements.

use cipherbench_core::{Label, Operation, StoreError, TransformError};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// One successful, measured iteration. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub operation: Operation,
    /// 1-based, monotonic within a loop.
    pub iteration: u64,
    pub label: Label,
    /// Always `>= 0`.
    pub cpu_percent: f32,
    /// Signed memory change across the iteration, in MiB.
    pub memory_delta_mb: f64,
    /// Process resident memory after the iteration, in MiB. Not a CSV column.
    pub resident_mb: f64,
    pub duration_sec: f64,
    pub output_size_bytes: u64,
    /// Bits per byte in `[0, 8]`; encryption rows only.
    pub entropy_bits_per_byte: Option<f64>,
}

/// Classification of every pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Encoding,
    Integrity,
    Format,
    KeyUnavailable,
    Cipher,
    StoreUnavailable,
    Timeout,
    Sink,
    InvalidTransition,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Integrity => "integrity",
            Self::Format => "format",
            Self::KeyUnavailable => "key_unavailable",
            Self::Cipher => "cipher",
            Self::StoreUnavailable => "store_unavailable",
            Self::Timeout => "timeout",
            Self::Sink => "sink",
            Self::InvalidTransition => "invalid_transition",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&TransformError> for FailureKind {
    fn from(err: &TransformError) -> Self {
        match err {
            TransformError::Encoding { .. } => Self::Encoding,
            TransformError::Integrity { .. } => Self::Integrity,
            TransformError::Format { .. } => Self::Format,
            TransformError::KeyUnavailable { .. } => Self::KeyUnavailable,
            TransformError::Cipher { .. } => Self::Cipher,
        }
    }
}

impl From<&StoreError> for FailureKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Unavailable { .. } => Self::StoreUnavailable,
        }
    }
}

/// A failed iteration, kept apart from the sample records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationFailure {
    pub operation: Operation,
    pub iteration: u64,
    pub label: Label,
    pub kind: FailureKind,
    pub message: String,
}

/// Duration statistics with percentile distribution, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub min_sec: f64,
    pub max_sec: f64,
    pub mean_sec: f64,
    /// Median (p50)
    pub median_sec: f64,
    pub p95_sec: f64,
    pub p99_sec: f64,
    pub std_dev_sec: f64,
}

impl DurationSummary {
    /// Calculate statistics from duration samples (in seconds).
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self {
                min_sec: 0.0,
                max_sec: 0.0,
                mean_sec: 0.0,
                median_sec: 0.0,
                p95_sec: 0.0,
                p99_sec: 0.0,
                std_dev_sec: 0.0,
            };
        }

        samples.sort_unstable_by(f64::total_cmp);
        let len = samples.len();
        let percentile = |p: f64| samples[((len as f64 * p) as usize).min(len - 1)];

        let mean_sec = samples.iter().sum::<f64>() / len as f64;

        // Calculate standard deviation
        let variance: f64 = samples
            .iter()
            .map(|&x| {
                let diff = x - mean_sec;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;

        Self {
            min_sec: samples[0],
            max_sec: samples[len - 1],
            mean_sec,
            median_sec: samples[len / 2],
            p95_sec: percentile(0.95),
            p99_sec: percentile(0.99),
            std_dev_sec: variance.sqrt(),
        }
    }

    /// Format a duration in human-readable form (auto-selects ns/μs/ms/s).
    pub fn format_duration(secs: f64) -> String {
        if secs < 1e-6 {
            format!("{:.0}ns", secs * 1e9)
        } else if secs < 1e-3 {
            format!("{:.2}μs", secs * 1e6)
        } else if secs < 1.0 {
            format!("{:.2}ms", secs * 1e3)
        } else {
            format!("{:.2}s", secs)
        }
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherbench_core::AlgorithmId;

    #[test]
    fn test_duration_summary_from_samples() {
        let samples = (1..=10).map(|i| i as f64 * 0.1).collect();
        let summary = DurationSummary::from_samples(samples);

        assert!((summary.min_sec - 0.1).abs() < 1e-9);
        assert!((summary.max_sec - 1.0).abs() < 1e-9);
        assert!((summary.median_sec - 0.6).abs() < 1e-9);
        assert!((summary.mean_sec - 0.55).abs() < 1e-9);
        assert!((summary.p99_sec - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_summary_single_and_empty() {
        let one = DurationSummary::from_samples(vec![0.25]);
        assert_eq!(one.p95_sec, 0.25);
        assert_eq!(one.std_dev_sec, 0.0);

        let none = DurationSummary::from_samples(Vec::new());
        assert_eq!(none.max_sec, 0.0);
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(DurationSummary::format_duration(5e-7), "500ns");
        assert_eq!(DurationSummary::format_duration(1.5e-6), "1.50μs");
        assert_eq!(DurationSummary::format_duration(0.0015), "1.50ms");
        assert_eq!(DurationSummary::format_duration(1.5), "1.50s");
    }

    #[test]
    fn test_failure_kind_classification() {
        let err = TransformError::KeyUnavailable {
            algorithm: AlgorithmId::EccP256,
            reason: "missing".to_string(),
        };
        assert_eq!(FailureKind::from(&err), FailureKind::KeyUnavailable);

        let err = StoreError::Unavailable {
            operation: "fetch_plaintext",
            reason: "down".to_string(),
        };
        assert_eq!(FailureKind::from(&err), FailureKind::StoreUnavailable);
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::KeyUnavailable).unwrap();
        assert_eq!(json, "\"key_unavailable\"");
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }
}

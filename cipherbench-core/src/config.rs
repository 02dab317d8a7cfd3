// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Validates sweep configurations before any payload is touched.
//! Any invalid field results in a HardValidationError that prevents startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BenchError, BenchResult, HardValidationError};
use crate::types::{AlgorithmId, IterationCount, Label, DEFAULT_ITERATIONS};

const MAX_TRY_COUNT: u32 = 100;
const MAX_SAMPLING_INTERVAL_MS: u64 = 5000;
const MAX_CPU_RETRIES: u32 = 10;

/// Raw benchmark section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawBenchmarkConfig {
    #[serde(default = "default_total_iterations")]
    total_iterations: u64,
    #[serde(default = "default_try_count")]
    try_count: u32,
    #[serde(default = "default_output_dir")]
    output_dir: String,
    #[serde(default = "default_verify")]
    verify: bool,
    #[serde(default = "default_max_consecutive_failures")]
    max_consecutive_failures: u32,
    #[serde(default = "default_iteration_timeout_ms")]
    iteration_timeout_ms: u64,
}

fn default_total_iterations() -> u64 {
    DEFAULT_ITERATIONS
}

fn default_try_count() -> u32 {
    1
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_verify() -> bool {
    true
}

fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_iteration_timeout_ms() -> u64 {
    60_000
}

impl Default for RawBenchmarkConfig {
    fn default() -> Self {
        Self {
            total_iterations: default_total_iterations(),
            try_count: default_try_count(),
            output_dir: default_output_dir(),
            verify: default_verify(),
            max_consecutive_failures: default_max_consecutive_failures(),
            iteration_timeout_ms: default_iteration_timeout_ms(),
        }
    }
}

/// Raw sampler section.
#[derive(Debug, Deserialize)]
struct RawSamplerConfig {
    #[serde(default = "default_sampling_interval_ms")]
    sampling_interval_ms: u64,
    #[serde(default = "default_cpu_retries")]
    cpu_retries: u32,
    #[serde(default = "default_cpu_fallback_percent")]
    cpu_fallback_percent: f32,
}

fn default_sampling_interval_ms() -> u64 {
    50
}

fn default_cpu_retries() -> u32 {
    3
}

fn default_cpu_fallback_percent() -> f32 {
    1.0
}

impl Default for RawSamplerConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: default_sampling_interval_ms(),
            cpu_retries: default_cpu_retries(),
            cpu_fallback_percent: default_cpu_fallback_percent(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStoreConfig {
    #[serde(default = "default_store_root")]
    root: String,
}

fn default_store_root() -> String {
    "./store".to_string()
}

impl Default for RawStoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMetricsConfig {
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct RawSweepConfig {
    algorithms: Vec<String>,
    labels: Vec<String>,
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    benchmark: RawBenchmarkConfig,
    #[serde(default)]
    sampler: RawSamplerConfig,
    #[serde(default)]
    store: RawStoreConfig,
    #[serde(default)]
    metrics: RawMetricsConfig,
    sweep: RawSweepConfig,
}

/// Validated benchmark settings.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub total_iterations: IterationCount,
    pub try_count: u32,
    pub output_dir: PathBuf,
    /// Run the inverse stage and compare the recovered plaintext.
    pub verify: bool,
    pub max_consecutive_failures: u32,
    pub iteration_timeout: Duration,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            total_iterations: IterationCount::default(),
            try_count: default_try_count(),
            output_dir: PathBuf::from(default_output_dir()),
            verify: default_verify(),
            max_consecutive_failures: default_max_consecutive_failures(),
            iteration_timeout: Duration::from_millis(default_iteration_timeout_ms()),
        }
    }
}

/// Validated sampler settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub sampling_interval: Duration,
    pub cpu_retries: u32,
    /// Reported when every CPU reading is exactly zero.
    pub cpu_fallback_percent: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sampling_interval: Duration::from_millis(default_sampling_interval_ms()),
            cpu_retries: default_cpu_retries(),
            cpu_fallback_percent: default_cpu_fallback_percent(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsConfig {
    pub port: Option<u16>,
}

/// The algorithm × label matrix to sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub algorithms: Vec<AlgorithmId>,
    pub labels: Vec<Label>,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub benchmark: BenchmarkConfig,
    pub sampler: SamplerConfig,
    pub store: StoreConfig,
    pub metrics: MetricsConfig,
    pub sweep: SweepConfig,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    /// Returns HardValidationError for any invalid fields.
    pub fn load_file(path: impl AsRef<Path>) -> BenchResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> BenchResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| BenchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> BenchResult<Config> {
        let benchmark = Self::validate_benchmark(raw.benchmark)?;
        let sampler = Self::validate_sampler(raw.sampler)?;
        let sweep = Self::validate_sweep(raw.sweep)?;

        if raw.store.root.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "store.root",
                value: raw.store.root,
                reason: "Store root cannot be empty".to_string(),
            }
            .into());
        }

        if raw.metrics.port == Some(0) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "metrics.port",
                value: "0".to_string(),
                reason: "Port 0 is reserved".to_string(),
            }
            .into());
        }

        Ok(Config {
            benchmark,
            sampler,
            store: StoreConfig {
                root: PathBuf::from(raw.store.root),
            },
            metrics: MetricsConfig {
                port: raw.metrics.port,
            },
            sweep,
        })
    }

    fn validate_benchmark(raw: RawBenchmarkConfig) -> BenchResult<BenchmarkConfig> {
        let total_iterations = IterationCount::new(raw.total_iterations)?;

        if raw.try_count == 0 || raw.try_count > MAX_TRY_COUNT {
            return Err(HardValidationError::InvalidFieldValue {
                field: "try_count",
                value: raw.try_count.to_string(),
                reason: format!("Must be between 1 and {}", MAX_TRY_COUNT),
            }
            .into());
        }

        if raw.output_dir.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "output_dir",
                value: raw.output_dir,
                reason: "Output directory cannot be empty".to_string(),
            }
            .into());
        }

        if raw.max_consecutive_failures == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "max_consecutive_failures",
                value: "0".to_string(),
                reason: "Must be greater than 0".to_string(),
            }
            .into());
        }

        if raw.iteration_timeout_ms == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "iteration_timeout_ms",
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(BenchmarkConfig {
            total_iterations,
            try_count: raw.try_count,
            output_dir: PathBuf::from(raw.output_dir),
            verify: raw.verify,
            max_consecutive_failures: raw.max_consecutive_failures,
            iteration_timeout: Duration::from_millis(raw.iteration_timeout_ms),
        })
    }

    fn validate_sampler(raw: RawSamplerConfig) -> BenchResult<SamplerConfig> {
        if raw.sampling_interval_ms == 0 || raw.sampling_interval_ms > MAX_SAMPLING_INTERVAL_MS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "sampling_interval_ms",
                value: raw.sampling_interval_ms.to_string(),
                reason: format!("Must be between 1 and {}", MAX_SAMPLING_INTERVAL_MS),
            }
            .into());
        }

        if raw.cpu_retries == 0 || raw.cpu_retries > MAX_CPU_RETRIES {
            return Err(HardValidationError::InvalidFieldValue {
                field: "cpu_retries",
                value: raw.cpu_retries.to_string(),
                reason: format!("Must be between 1 and {}", MAX_CPU_RETRIES),
            }
            .into());
        }

        let fallback = raw.cpu_fallback_percent;
        if !fallback.is_finite() || fallback <= 0.0 || fallback > 100.0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "cpu_fallback_percent",
                value: fallback.to_string(),
                reason: "Must be greater than 0 and at most 100".to_string(),
            }
            .into());
        }

        Ok(SamplerConfig {
            sampling_interval: Duration::from_millis(raw.sampling_interval_ms),
            cpu_retries: raw.cpu_retries,
            cpu_fallback_percent: fallback,
        })
    }

    fn validate_sweep(raw: RawSweepConfig) -> BenchResult<SweepConfig> {
        if raw.algorithms.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "algorithms",
                context: "sweep".to_string(),
            }
            .into());
        }
        if raw.labels.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "labels",
                context: "sweep".to_string(),
            }
            .into());
        }

        let mut algorithms = Vec::with_capacity(raw.algorithms.len());
        let mut seen_algorithms = HashSet::new();
        for name in raw.algorithms {
            let algorithm: AlgorithmId = name.parse()?;
            // Check for duplicates - fail fast
            if !seen_algorithms.insert(algorithm) {
                return Err(HardValidationError::DuplicateEntry {
                    field: "sweep.algorithms",
                    value: algorithm.to_string(),
                }
                .into());
            }
            algorithms.push(algorithm);
        }

        let mut labels = Vec::with_capacity(raw.labels.len());
        let mut seen_labels = HashSet::new();
        for (index, raw_label) in raw.labels.into_iter().enumerate() {
            let label = Label::new(raw_label).map_err(|e| HardValidationError::InvalidFieldValue {
                field: "sweep.labels",
                value: format!("entry {}", index),
                reason: e.to_string(),
            })?;
            if !seen_labels.insert(label.clone()) {
                return Err(HardValidationError::DuplicateEntry {
                    field: "sweep.labels",
                    value: label.to_string(),
                }
                .into());
            }
            labels.push(label);
        }

        Ok(SweepConfig { algorithms, labels })
    }
}

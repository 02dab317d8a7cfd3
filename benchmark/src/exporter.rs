// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Pull-based metrics exporter.
//!
//! Owns its own prometheus registry; nothing is registered process-wide.

use cipherbench_core::Label;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::metrics::SampleRecord;

/// Counters and gauges fed by the pipeline.
#[derive(Clone)]
pub struct MetricsExporter {
    registry: Registry,
    bytes_processed: IntCounterVec,
    operations: IntCounterVec,
    failures: IntCounterVec,
    cpu_usage: Gauge,
    memory_usage: Gauge,
    memory_delta: Gauge,
    duration: HistogramVec,
}

impl MetricsExporter {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bytes_processed = IntCounterVec::new(
            Opts::new("bytes_processed_total", "Output bytes produced by transforms"),
            &["label"],
        )?;
        let operations = IntCounterVec::new(
            Opts::new("operations_total", "Successful measured operations"),
            &["label"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("operation_failures_total", "Failed iterations and failed runs"),
            &["label"],
        )?;
        let cpu_usage = Gauge::new("cpu_usage_percent", "CPU utilization of the last operation")?;
        let memory_usage = Gauge::new(
            "memory_usage_mb",
            "Process resident memory after the last operation in MiB",
        )?;
        let memory_delta = Gauge::new(
            "memory_delta_mb",
            "Signed change in process memory across the last operation in MiB",
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "operation_duration_seconds",
                "Wall-clock duration of measured operations",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
            ]),
            &["label"],
        )?;

        registry.register(Box::new(bytes_processed.clone()))?;
        registry.register(Box::new(operations.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(cpu_usage.clone()))?;
        registry.register(Box::new(memory_usage.clone()))?;
        registry.register(Box::new(memory_delta.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            bytes_processed,
            operations,
            failures,
            cpu_usage,
            memory_usage,
            memory_delta,
            duration,
        })
    }

    /// Fold one successful iteration.
    pub fn observe(&self, record: &SampleRecord) {
        let label = [record.label.as_str()];
        self.bytes_processed
            .with_label_values(&label)
            .inc_by(record.output_size_bytes);
        self.operations.with_label_values(&label).inc();
        self.duration
            .with_label_values(&label)
            .observe(record.duration_sec);
        self.cpu_usage.set(record.cpu_percent as f64);
        self.memory_usage.set(record.resident_mb);
        self.memory_delta.set(record.memory_delta_mb);
    }

    pub fn record_failure(&self, label: &Label) {
        self.failures.with_label_values(&[label.as_str()]).inc();
    }

    pub fn operations(&self, label: &Label) -> u64 {
        self.operations.with_label_values(&[label.as_str()]).get()
    }

    pub fn failures(&self, label: &Label) -> u64 {
        self.failures.with_label_values(&[label.as_str()]).get()
    }

    /// Text exposition format of every metric.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }

        String::from_utf8(buffer).unwrap_or_else(|_| String::from("Encoding error"))
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherbench_core::Operation;

    fn record(label: &str, size: u64) -> SampleRecord {
        SampleRecord {
            operation: Operation::Encryption,
            iteration: 1,
            label: Label::new(label).unwrap(),
            cpu_percent: 42.0,
            memory_delta_mb: 1.5,
            resident_mb: 64.0,
            duration_sec: 0.003,
            output_size_bytes: size,
            entropy_bits_per_byte: Some(7.9),
        }
    }

    #[test]
    fn test_observe_accumulates_per_label() {
        let exporter = MetricsExporter::new().unwrap();
        exporter.observe(&record("100KB file", 100));
        exporter.observe(&record("100KB file", 50));
        exporter.observe(&record("1MB file", 10));

        let small = Label::new("100KB file").unwrap();
        assert_eq!(exporter.operations(&small), 2);
        assert_eq!(
            exporter.bytes_processed.with_label_values(&["100KB file"]).get(),
            150
        );
    }

    #[test]
    fn test_render_contains_all_families() {
        let exporter = MetricsExporter::new().unwrap();
        exporter.observe(&record("100KB file", 100));
        exporter.record_failure(&Label::new("100KB file").unwrap());

        let text = exporter.render();
        for name in [
            "bytes_processed_total",
            "operations_total",
            "operation_failures_total",
            "cpu_usage_percent",
            "memory_usage_mb",
            "memory_delta_mb",
            "operation_duration_seconds_bucket",
        ] {
            assert!(text.contains(name), "missing {}", name);
        }
        assert!(text.contains("label=\"100KB file\""));
    }

    #[test]
    fn test_memory_usage_is_resident_not_delta() {
        let exporter = MetricsExporter::new().unwrap();
        let mut freed = record("100KB file", 100);
        freed.memory_delta_mb = -0.25;
        freed.resident_mb = 80.5;
        exporter.observe(&freed);

        assert_eq!(exporter.memory_usage.get(), 80.5);
        assert_eq!(exporter.memory_delta.get(), -0.25);
        let text = exporter.render();
        assert!(text.contains("memory_usage_mb 80.5"), "{}", text);
        assert!(text.contains("memory_delta_mb -0.25"), "{}", text);
    }

    #[test]
    fn test_exporters_do_not_share_state() {
        let a = MetricsExporter::new().unwrap();
        let b = MetricsExporter::new().unwrap();
        let label = Label::new("x").unwrap();
        a.record_failure(&label);
        assert_eq!(a.failures(&label), 1);
        assert_eq!(b.failures(&label), 0);
    }
}

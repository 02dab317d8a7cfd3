// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Append-only result sinks.
//!
//! Each appended record is written and flushed as exactly one row before
//! `append` returns. Rows are never rewritten. Failed iterations go to a
//! separate failures file next to the results, created on first failure.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use cipherbench_core::{AlgorithmId, Label};
use thiserror::Error;

use crate::metrics::{IterationFailure, SampleRecord};

/// CSV header, in column order.
pub const CSV_HEADER: [&str; 8] = [
    "operation",
    "iteration_number",
    "label",
    "cpu_percent",
    "memory_used_mb",
    "process_time_sec",
    "output_size_bytes",
    "entropy_bits_per_byte",
];

/// Failures CSV header, in column order.
pub const FAILURE_CSV_HEADER: [&str; 5] = ["operation", "iteration_number", "label", "kind", "message"];

/// Errors raised while persisting records.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Result file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for sample records and failed iterations.
pub trait ResultSink {
    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError>;

    /// Persist one failed iteration before the loop moves on.
    fn append_failure(&mut self, failure: &IterationFailure) -> Result<(), SinkError>;
}

/// Result file name for one (try, algorithm, label) run.
///
/// `AES_GCM_METRICS_100KB_1TRY_50loops.csv`
pub fn csv_file_name(
    algorithm: AlgorithmId,
    label: &Label,
    try_number: u32,
    total_iterations: u64,
) -> String {
    format!(
        "{}_METRICS_{}_{}TRY_{}loops.csv",
        algorithm.file_prefix(),
        label.size_tag(),
        try_number,
        total_iterations
    )
}

/// Failures file paired with a results file:
/// `run.csv` becomes `run_FAILURES.csv`.
pub fn failures_path(results: &Path) -> PathBuf {
    let stem = results
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    results.with_file_name(format!("{}_FAILURES.csv", stem))
}

/// Open `path` for appending, writing `header` only when the file is empty.
fn open_append(path: &Path, header: &[&str]) -> Result<csv::Writer<File>, SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let is_empty = file.metadata().map_err(io_err)?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_empty {
        writer.write_record(header)?;
        writer.flush().map_err(io_err)?;
    }

    tracing::debug!(path = %path.display(), new_file = is_empty, "Opened CSV file");
    Ok(writer)
}

/// CSV file sink opened in append mode.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    failures: Option<csv::Writer<File>>,
}

impl CsvSink {
    /// Open `path` for appending, creating parents as needed.
    /// The header is written only when the file is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let writer = open_append(&path, &CSV_HEADER)?;
        Ok(Self {
            path,
            writer,
            failures: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvSink {
    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError> {
        let entropy = record
            .entropy_bits_per_byte
            .map(|e| e.to_string())
            .unwrap_or_default();

        let iteration = record.iteration.to_string();
        let cpu = record.cpu_percent.to_string();
        let memory = record.memory_delta_mb.to_string();
        let duration = record.duration_sec.to_string();
        let size = record.output_size_bytes.to_string();

        self.writer.write_record([
            record.operation.as_str(),
            iteration.as_str(),
            record.label.as_str(),
            cpu.as_str(),
            memory.as_str(),
            duration.as_str(),
            size.as_str(),
            entropy.as_str(),
        ])?;
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn append_failure(&mut self, failure: &IterationFailure) -> Result<(), SinkError> {
        let path = failures_path(&self.path);
        let writer = match self.failures.take() {
            Some(writer) => writer,
            None => open_append(&path, &FAILURE_CSV_HEADER)?,
        };
        let writer = self.failures.insert(writer);

        let iteration = failure.iteration.to_string();
        writer.write_record([
            failure.operation.as_str(),
            iteration.as_str(),
            failure.label.as_str(),
            failure.kind.as_str(),
            failure.message.as_str(),
        ])?;
        writer.flush().map_err(|source| SinkError::Io { path, source })
    }
}

/// In-memory sink for tests and in-process inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<SampleRecord>,
    failures: Vec<IterationFailure>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[IterationFailure] {
        &self.failures
    }
}

impl ResultSink for MemorySink {
    fn append(&mut self, record: &SampleRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn append_failure(&mut self, failure: &IterationFailure) -> Result<(), SinkError> {
        self.failures.push(failure.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FailureKind;
    use cipherbench_core::Operation;
    use tempfile::TempDir;

    fn record(operation: Operation, iteration: u64) -> SampleRecord {
        SampleRecord {
            operation,
            iteration,
            label: Label::new("100KB file").unwrap(),
            cpu_percent: 12.5,
            memory_delta_mb: -0.25,
            resident_mb: 64.0,
            duration_sec: 0.002,
            output_size_bytes: 102_428,
            entropy_bits_per_byte: (operation == Operation::Encryption).then_some(7.99),
        }
    }

    #[test]
    fn test_file_name() {
        let label = Label::new("100KB file").unwrap();
        assert_eq!(
            csv_file_name(AlgorithmId::AesGcm, &label, 1, 50),
            "AES_GCM_METRICS_100KB_1TRY_50loops.csv"
        );
        let label = Label::new("Another 1MB file").unwrap();
        assert_eq!(
            csv_file_name(AlgorithmId::DiffieHellman, &label, 3, 10),
            "DIFFIE_HELLMAN_METRICS_ANOTHER1MB_3TRY_10loops.csv"
        );
    }

    #[test]
    fn test_csv_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/run.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record(Operation::Encryption, 1)).unwrap();
        sink.append(&record(Operation::Decryption, 1)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(lines[1], "encryption,1,100KB file,12.5,-0.25,0.002,102428,7.99");
        assert_eq!(lines[2], "decryption,1,100KB file,12.5,-0.25,0.002,102428,");
    }

    #[test]
    fn test_reopen_does_not_repeat_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&record(Operation::Encryption, 1)).unwrap();
        }
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&record(Operation::Encryption, 2)).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("operation,iteration_number").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_rows_visible_before_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record(Operation::Encryption, 1)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    fn failure(iteration: u64) -> IterationFailure {
        IterationFailure {
            operation: Operation::Decryption,
            iteration,
            label: Label::new("100KB file").unwrap(),
            kind: FailureKind::Integrity,
            message: "authentication failed, artifact corrupted".to_string(),
        }
    }

    #[test]
    fn test_failures_path() {
        assert_eq!(
            failures_path(Path::new("out/AES_GCM_METRICS_1MB_1TRY_5loops.csv")),
            PathBuf::from("out/AES_GCM_METRICS_1MB_1TRY_5loops_FAILURES.csv")
        );
    }

    #[test]
    fn test_failures_written_as_they_happen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        let failures = failures_path(&path);
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record(Operation::Encryption, 1)).unwrap();
        assert!(!failures.exists());

        sink.append_failure(&failure(1)).unwrap();
        let content = fs::read_to_string(&failures).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], FAILURE_CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "decryption,1,100KB file,integrity,\"authentication failed, artifact corrupted\""
        );

        sink.append_failure(&failure(2)).unwrap();
        assert_eq!(fs::read_to_string(&failures).unwrap().lines().count(), 3);
        // Results file is untouched by failures.
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_failures_reopen_does_not_repeat_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        for iteration in 1..=2 {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append_failure(&failure(iteration)).unwrap();
        }
        let content = fs::read_to_string(failures_path(&path)).unwrap();
        assert_eq!(content.matches("operation,iteration_number").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.append(&record(Operation::Encryption, 1)).unwrap();
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].iteration, 1);

        sink.append_failure(&failure(2)).unwrap();
        assert_eq!(sink.failures(), &[failure(2)]);
    }
}

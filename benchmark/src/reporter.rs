// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report generation for sweep results.
//!
//! Saves sweep reports to timestamped JSON files next to the CSV output.

use crate::report::SweepReport;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to create output directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON reporter for sweep results.
pub struct JsonReporter {
    /// Output directory for report files
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Save a sweep report to a JSON file.
    ///
    /// Returns the path to the created file.
    pub fn save(&self, report: &SweepReport) -> Result<PathBuf, ReporterError> {
        let timestamp = report.timestamp.format("%Y-%m-%dT%H-%M-%SZ");
        let filename = format!("sweep_{}.json", timestamp);
        let filepath = self.output_dir.join(&filename);

        let file = File::create(&filepath)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        tracing::info!(path = %filepath.display(), runs = report.runs.len(), "Saved sweep report");
        Ok(filepath)
    }

    /// List all existing sweep reports in the output directory.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing sweep report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<SweepReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{RunOutcome, RunReport};
    use cipherbench_core::{AlgorithmId, Label, PipelineState};
    use tempfile::TempDir;

    fn run_report() -> RunReport {
        RunReport {
            algorithm: AlgorithmId::AesGcm,
            label: Label::new("100KB file").unwrap(),
            try_number: 1,
            total_iterations: 10,
            outcome: RunOutcome::Empty {
                stage: PipelineState::FetchSource,
            },
            encryption: None,
            decryption: None,
            csv_path: None,
        }
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let mut report = SweepReport::new();
        report.add_run(run_report());

        let path = reporter.save(&report).unwrap();
        assert!(path.exists());

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.runs.len(), 1);
        assert_eq!(loaded.runs[0].algorithm, AlgorithmId::AesGcm);
        assert_eq!(loaded.runs[0].outcome, report.runs[0].outcome);
    }

    #[test]
    fn test_list_reports() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path().join("nested")).unwrap();

        reporter.save(&SweepReport::new()).unwrap();
        std::fs::write(temp_dir.path().join("nested/notes.txt"), "x").unwrap();

        let reports = reporter.list_reports().unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonReporter::load(&path),
            Err(ReporterError::Serialization(_))
        ));
    }
}

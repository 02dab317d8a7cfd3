// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cipherbench reports` command - Inspect saved sweep reports.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cipherbench_benchmark::{JsonReporter, SweepReport};

use super::run::print_summary;

pub async fn execute(dir: &Path, show: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = show {
        let report = JsonReporter::load(path)
            .with_context(|| format!("Cannot load report {}", path.display()))?;
        println!(
            "Sweep {} ({} v{})",
            report.timestamp.to_rfc3339(),
            report.benchmark_suite,
            report.version
        );
        println!(
            "Host: {} / {} cores / {}",
            report.system_info.os, report.system_info.cpu_cores, report.system_info.cpu_model
        );
        print_summary(&report);
        return Ok(());
    }

    let reports = load_reports(dir)?;

    println!("╔═══════════════════════════════════╦═══════╦═══════════╦════════╗");
    println!("║ Report                            ║ Runs  ║ Completed ║ Failed ║");
    println!("╠═══════════════════════════════════╬═══════╬═══════════╬════════╣");
    for (path, report) in &reports {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "║ {:<33} ║ {:>5} ║ {:>9} ║ {:>6} ║",
            name,
            report.runs.len(),
            report.completed(),
            report.failed()
        );
    }
    println!("╚═══════════════════════════════════╩═══════╩═══════════╩════════╝");
    println!();
    println!("Total: {} report(s) in {}", reports.len(), dir.display());

    Ok(())
}

/// Every sweep report in `dir`, oldest first. Unreadable files are skipped.
fn load_reports(dir: &Path) -> anyhow::Result<Vec<(PathBuf, SweepReport)>> {
    if !dir.is_dir() {
        bail!("Report directory {} does not exist", dir.display());
    }

    let reporter = JsonReporter::new(dir)?;
    let mut reports = Vec::new();
    for path in reporter.list_reports()? {
        match JsonReporter::load(&path) {
            Ok(report) => reports.push((path, report)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable report")
            }
        }
    }
    Ok(reports)
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cipherbench seed` command - Ingest plaintext payloads.
//!
//! Writes generated or on-disk payloads into the plaintext column of a
//! file store, keyed by label.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cipherbench_core::payload::{generate_text_payload, parse_size_label, standard_payloads};
use cipherbench_core::{FileStore, Label, PayloadStore};

pub async fn execute(
    store_root: &Path,
    standard: bool,
    generate: &[String],
    files: &[(String, PathBuf)],
) -> anyhow::Result<()> {
    let payloads = collect_payloads(standard, generate, files)?;
    if payloads.is_empty() {
        bail!("Nothing to seed: pass --standard, --generate LABEL or --file LABEL=PATH");
    }

    let store = FileStore::open(store_root)
        .with_context(|| format!("Cannot open store at {}", store_root.display()))?;
    let count = ingest(&store, payloads)?;

    println!();
    println!("Seeded {} payload(s) into {}", count, store_root.display());
    Ok(())
}

/// Parse a `LABEL=PATH` argument.
pub fn parse_file_arg(arg: &str) -> Result<(String, PathBuf), String> {
    let (label, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{}'", arg))?;
    if path.is_empty() {
        return Err(format!("missing path in '{}'", arg));
    }
    Label::new(label).map_err(|e| e.to_string())?;
    Ok((label.to_string(), PathBuf::from(path)))
}

fn collect_payloads(
    standard: bool,
    generate: &[String],
    files: &[(String, PathBuf)],
) -> anyhow::Result<Vec<(Label, Vec<u8>)>> {
    let mut payloads = Vec::new();

    if standard {
        payloads.extend(standard_payloads());
    }

    for raw in generate {
        let label = Label::new(raw.as_str())?;
        let size = parse_size_label(raw)?;
        payloads.push((label, generate_text_payload(size)));
    }

    for (raw, path) in files {
        let label = Label::new(raw.as_str())?;
        let data = std::fs::read(path)
            .with_context(|| format!("Cannot read payload file {}", path.display()))?;
        payloads.push((label, data));
    }

    Ok(payloads)
}

fn ingest(store: &dyn PayloadStore, payloads: Vec<(Label, Vec<u8>)>) -> anyhow::Result<usize> {
    let count = payloads.len();
    for (label, data) in payloads {
        store.ingest_plaintext(&label, &data)?;
        tracing::info!(label = %label, bytes = data.len(), "Ingested plaintext");
        println!("  ✓ {:<20} {} bytes", label.as_str(), data.len());
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_file_arg() {
        let (label, path) = parse_file_arg("1MB file=/tmp/data.txt").unwrap();
        assert_eq!(label, "1MB file");
        assert_eq!(path, PathBuf::from("/tmp/data.txt"));

        assert!(parse_file_arg("no separator").is_err());
        assert!(parse_file_arg("label=").is_err());
        assert!(parse_file_arg("=/tmp/x").is_err());
    }

    #[test]
    fn test_collect_generated_and_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.txt");
        std::fs::write(&file, "custom payload").unwrap();

        let payloads = collect_payloads(
            false,
            &["2KB file".to_string()],
            &[("custom".to_string(), file)],
        )
        .unwrap();

        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].1.len() >= 2048);
        assert_eq!(payloads[1].1, b"custom payload");
    }

    #[test]
    fn test_bad_size_label_rejected() {
        assert!(collect_payloads(false, &["lots of data".to_string()], &[]).is_err());
    }

    #[test]
    fn test_oversized_label_rejected_before_allocation() {
        let err = collect_payloads(false, &["16000000000G file".to_string()], &[]).unwrap_err();
        assert!(err.to_string().contains("limit"), "{}", err);
    }

    #[test]
    fn test_ingest_into_file_store() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let payloads = collect_payloads(true, &[], &[]).unwrap();
        assert_eq!(payloads.len(), 7);

        assert_eq!(ingest(&store, payloads).unwrap(), 7);
        let label = Label::new("100KB file").unwrap();
        let stored = store.fetch_plaintext(&label).unwrap().unwrap();
        assert!(stored.len() >= 100 * 1024);
    }
}

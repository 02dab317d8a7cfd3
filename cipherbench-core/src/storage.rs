// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Payload store collaborator.
//!
//! Three columns per label: the plaintext source (Stage A), and per algorithm
//! the committed artifact (Stage B) and the recovered result (Stage C). Commits
//! overwrite: a label holds at most one value per column.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::types::{AlgorithmId, Label};

/// Store of payloads and pipeline outputs, keyed by label.
pub trait PayloadStore: Send + Sync {
    /// Stage A read. `None` when no row exists for the label.
    fn fetch_plaintext(&self, label: &Label) -> StoreResult<Option<Vec<u8>>>;

    /// Stage A write.
    fn ingest_plaintext(&self, label: &Label, data: &[u8]) -> StoreResult<()>;

    /// Stage B write.
    fn commit_artifact(&self, algorithm: AlgorithmId, label: &Label, data: &[u8])
        -> StoreResult<()>;

    /// Stage B read.
    fn fetch_artifact(&self, algorithm: AlgorithmId, label: &Label)
        -> StoreResult<Option<Vec<u8>>>;

    /// Stage C write.
    fn commit_result(&self, algorithm: AlgorithmId, label: &Label, data: &[u8])
        -> StoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Plaintext,
    Artifact(AlgorithmId),
    Result(AlgorithmId),
}

/// In-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<(Column, Label), Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&self, column: Column, label: &Label, data: &[u8]) {
        let mut lock = self.data.write().unwrap_or_else(|e| e.into_inner());
        lock.insert((column, label.clone()), data.to_vec());
    }

    fn get(&self, column: Column, label: &Label) -> Option<Vec<u8>> {
        let lock = self.data.read().unwrap_or_else(|e| e.into_inner());
        lock.get(&(column, label.clone())).cloned()
    }

    /// Stage C read, for inspection.
    pub fn result(&self, algorithm: AlgorithmId, label: &Label) -> Option<Vec<u8>> {
        self.get(Column::Result(algorithm), label)
    }

    /// Overwrite a committed artifact without going through a pipeline.
    pub fn replace_artifact(&self, algorithm: AlgorithmId, label: &Label, data: &[u8]) {
        self.put(Column::Artifact(algorithm), label, data);
    }
}

impl PayloadStore for MemoryStore {
    fn fetch_plaintext(&self, label: &Label) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(Column::Plaintext, label))
    }

    fn ingest_plaintext(&self, label: &Label, data: &[u8]) -> StoreResult<()> {
        self.put(Column::Plaintext, label, data);
        Ok(())
    }

    fn commit_artifact(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
        data: &[u8],
    ) -> StoreResult<()> {
        self.put(Column::Artifact(algorithm), label, data);
        Ok(())
    }

    fn fetch_artifact(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
    ) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(Column::Artifact(algorithm), label))
    }

    fn commit_result(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
        data: &[u8],
    ) -> StoreResult<()> {
        self.put(Column::Result(algorithm), label, data);
        Ok(())
    }
}

/// Directory-backed store.
///
/// Layout under the root:
/// ```text
/// plaintext/<hex(label)>.bin
/// <algorithm>/artifact/<hex(label)>.bin
/// <algorithm>/result/<hex(label)>.bin
/// ```
/// Writes go to a temp file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io("open", e))?;
        tracing::debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, column: Column, label: &Label) -> PathBuf {
        let file = format!("{}.bin", hex::encode(label.as_str().as_bytes()));
        match column {
            Column::Plaintext => self.root.join("plaintext").join(file),
            Column::Artifact(alg) => self.root.join(alg.as_str()).join("artifact").join(file),
            Column::Result(alg) => self.root.join(alg.as_str()).join("result").join(file),
        }
    }

    fn read(
        &self,
        operation: &'static str,
        column: Column,
        label: &Label,
    ) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(column, label)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(operation, e)),
        }
    }

    fn write(
        &self,
        operation: &'static str,
        column: Column,
        label: &Label,
        data: &[u8],
    ) -> StoreResult<()> {
        let path = self.path_for(column, label);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| StoreError::io(operation, e))?;

        let tmp = path.with_extension("bin.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(operation, e))?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(operation, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(operation, e))?;

        tracing::debug!(
            operation,
            label = %label,
            bytes = data.len(),
            "Wrote store entry"
        );
        Ok(())
    }
}

impl PayloadStore for FileStore {
    fn fetch_plaintext(&self, label: &Label) -> StoreResult<Option<Vec<u8>>> {
        self.read("fetch_plaintext", Column::Plaintext, label)
    }

    fn ingest_plaintext(&self, label: &Label, data: &[u8]) -> StoreResult<()> {
        self.write("ingest_plaintext", Column::Plaintext, label, data)
    }

    fn commit_artifact(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
        data: &[u8],
    ) -> StoreResult<()> {
        self.write("commit_artifact", Column::Artifact(algorithm), label, data)
    }

    fn fetch_artifact(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
    ) -> StoreResult<Option<Vec<u8>>> {
        self.read("fetch_artifact", Column::Artifact(algorithm), label)
    }

    fn commit_result(
        &self,
        algorithm: AlgorithmId,
        label: &Label,
        data: &[u8],
    ) -> StoreResult<()> {
        self.write("commit_result", Column::Result(algorithm), label, data)
    }
}

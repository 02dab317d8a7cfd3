// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a payload label.
const MAX_LABEL_LEN: usize = 128;
/// Maximum iterations in a single pipeline run.
const MAX_ITERATIONS: u64 = 1_000_000;
/// Iterations per run when none are configured.
pub const DEFAULT_ITERATIONS: u64 = 50;

/// Validated payload size label, e.g. `"100KB file"`.
/// Must be non-blank, at most 128 chars, and free of control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Create a new Label with validation.
    pub fn new(label: impl Into<String>) -> Result<Self, HardValidationError> {
        let label = label.into();

        if label.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "label",
                value: label,
                reason: "Label cannot be blank".to_string(),
            });
        }

        if label.chars().count() > MAX_LABEL_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "label",
                value: label.clone(),
                reason: format!(
                    "Label too long: {} chars (max {})",
                    label.chars().count(),
                    MAX_LABEL_LEN
                ),
            });
        }

        if label.chars().any(char::is_control) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "label",
                value: label.escape_default().to_string(),
                reason: "Label must not contain control characters".to_string(),
            });
        }

        Ok(Self(label))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compact upper-case size tag used in result file names.
    ///
    /// `"100KB file"` becomes `"100KB"`, `"Another 1MB file"` becomes `"ANOTHER1MB"`.
    pub fn size_tag(&self) -> String {
        let tag: String = self
            .0
            .split_whitespace()
            .filter(|word| !word.eq_ignore_ascii_case("file"))
            .collect::<Vec<_>>()
            .concat()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
            .collect();

        if tag.is_empty() {
            hex::encode(self.0.as_bytes()).to_uppercase()
        } else {
            tag.to_uppercase()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Label {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

/// Identifier of a transform algorithm under benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AlgorithmId {
    AesGcm,
    ChaCha20Poly1305,
    XChaCha20Poly1305,
    EccP256,
    DiffieHellman,
    Blowfish,
}

impl AlgorithmId {
    /// Every built-in algorithm, in registry order.
    pub const ALL: [AlgorithmId; 6] = [
        Self::AesGcm,
        Self::ChaCha20Poly1305,
        Self::XChaCha20Poly1305,
        Self::EccP256,
        Self::DiffieHellman,
        Self::Blowfish,
    ];

    /// Stable kebab-case identifier used in configuration and store paths.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AesGcm => "aes-gcm",
            Self::ChaCha20Poly1305 => "chacha20-poly1305",
            Self::XChaCha20Poly1305 => "xchacha20-poly1305",
            Self::EccP256 => "ecc-p256",
            Self::DiffieHellman => "diffie-hellman",
            Self::Blowfish => "blowfish",
        }
    }

    /// Upper-case prefix used in result file names.
    pub const fn file_prefix(&self) -> &'static str {
        match self {
            Self::AesGcm => "AES_GCM",
            Self::ChaCha20Poly1305 => "CHACHA20_POLY1305",
            Self::XChaCha20Poly1305 => "XCHACHA20_POLY1305",
            Self::EccP256 => "ECC_P256",
            Self::DiffieHellman => "DIFFIE_HELLMAN",
            Self::Blowfish => "BLOWFISH",
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| HardValidationError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for AlgorithmId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AlgorithmId> for String {
    fn from(id: AlgorithmId) -> Self {
        id.as_str().to_string()
    }
}

/// Direction of a measured operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Forward transform (plaintext → artifact).
    Encryption,
    /// Inverse transform (artifact → plaintext).
    Decryption,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated iteration count for a pipeline run.
/// Must be in range 1..=1_000_000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct IterationCount(u64);

impl IterationCount {
    /// Create a new IterationCount with bounds validation.
    pub fn new(count: u64) -> Result<Self, HardValidationError> {
        if !(1..=MAX_ITERATIONS).contains(&count) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "total_iterations",
                value: count.to_string(),
                reason: format!("Must be between 1 and {}", MAX_ITERATIONS),
            });
        }
        Ok(Self(count))
    }

    /// Get the inner count.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Default for IterationCount {
    fn default() -> Self {
        Self(DEFAULT_ITERATIONS)
    }
}

impl fmt::Display for IterationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for IterationCount {
    type Error = HardValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IterationCount> for u64 {
    fn from(count: IterationCount) -> Self {
        count.0
    }
}

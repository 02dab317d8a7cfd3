// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Transform plugin contract and the built-in encryption plugins.
//!
//! A plugin exposes a forward transform (`plaintext -> artifact`) and its
//! inverse. Plugins hold no global state: key material is handed to them by
//! the [`KeyStore`](crate::keys::KeyStore) at construction.

mod symmetric;
mod blowfish;
mod dh;
mod ecies;

pub use symmetric::{AeadPlugin, AesGcmPlugin, ChaCha20Poly1305Plugin, XChaCha20Poly1305Plugin};
pub use blowfish::BlowfishPlugin;
pub use dh::DiffieHellmanPlugin;
pub use ecies::EciesP256Plugin;

use crate::error::{TransformError, TransformResult};
use crate::types::AlgorithmId;

/// Output of one forward transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// The artifact bytes.
    pub output: Vec<u8>,
    /// Artifact size in bytes.
    pub size: usize,
}

impl Transformed {
    pub fn new(output: Vec<u8>) -> Self {
        let size = output.len();
        Self { output, size }
    }
}

/// A reversible data transform under benchmark.
pub trait TransformPlugin: Send + Sync {
    /// Algorithm this plugin implements.
    fn algorithm(&self) -> AlgorithmId;

    /// Forward transform. Fails with `Encoding` if `plaintext` is not UTF-8.
    fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed>;

    /// Inverse transform. Fails with `Integrity` on authentication failure and
    /// `Format` on malformed framing.
    fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>>;
}

impl std::fmt::Debug for dyn TransformPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPlugin")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

/// Reject input that is not UTF-8 text.
fn require_utf8(data: &[u8], what: &str) -> TransformResult<()> {
    std::str::from_utf8(data)
        .map(|_| ())
        .map_err(|e| TransformError::Encoding {
            reason: format!("{} is not valid UTF-8: {}", what, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformed_size_matches_output() {
        let t = Transformed::new(vec![1, 2, 3]);
        assert_eq!(t.size, 3);
    }

    #[test]
    fn test_require_utf8() {
        assert!(require_utf8("héllo".as_bytes(), "plaintext").is_ok());
        let err = require_utf8(&[0xff, 0xfe], "plaintext").unwrap_err();
        assert!(matches!(err, TransformError::Encoding { .. }));
        assert!(err.to_string().contains("plaintext"));
    }
}

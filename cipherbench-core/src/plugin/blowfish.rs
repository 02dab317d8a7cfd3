// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Blowfish in ECB mode with PKCS#7 padding.
//!
//! Unauthenticated: a corrupted artifact surfaces as a padding (`Format`)
//! or text (`Encoding`) error, or as a round-trip mismatch, never as
//! `Integrity`.
//!
//! Artifact format (binary):
//! ```text
//! [N * 8 bytes: ciphertext blocks]
//! ```

use blowfish::Blowfish;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::crypto_common::InnerInit;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};

use super::{require_utf8, TransformPlugin, Transformed};
use crate::error::{TransformError, TransformResult};
use crate::keys::KeyMaterial;
use crate::types::AlgorithmId;

/// Blowfish block size in bytes.
pub const BLOCK_LEN: usize = 8;

type EcbEncryptor = ecb::Encryptor<Blowfish>;
type EcbDecryptor = ecb::Decryptor<Blowfish>;

pub struct BlowfishPlugin {
    cipher: Blowfish,
}

impl BlowfishPlugin {
    /// Build from key-store material; only symmetric keys are accepted.
    pub fn new(material: &KeyMaterial) -> TransformResult<Self> {
        match material {
            KeyMaterial::Symmetric(key) => Self::with_key(key.as_bytes()),
            other => Err(TransformError::KeyUnavailable {
                algorithm: AlgorithmId::Blowfish,
                reason: format!("expected symmetric key, found {}", other.kind()),
            }),
        }
    }

    /// Blowfish accepts keys of 4 to 56 bytes.
    pub fn with_key(key: &[u8]) -> TransformResult<Self> {
        let cipher =
            Blowfish::new_from_slice(key).map_err(|_| TransformError::KeyUnavailable {
                algorithm: AlgorithmId::Blowfish,
                reason: format!("invalid key length: {} bytes", key.len()),
            })?;
        Ok(Self { cipher })
    }
}

impl TransformPlugin for BlowfishPlugin {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Blowfish
    }

    fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed> {
        require_utf8(plaintext, "plaintext")?;
        let output = EcbEncryptor::inner_init(self.cipher.clone())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(Transformed::new(output))
    }

    fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
        if artifact.is_empty() || artifact.len() % BLOCK_LEN != 0 {
            return Err(TransformError::Format {
                reason: format!(
                    "blowfish artifact length {} is not a positive multiple of {}",
                    artifact.len(),
                    BLOCK_LEN
                ),
            });
        }

        let plaintext = EcbDecryptor::inner_init(self.cipher.clone())
            .decrypt_padded_vec_mut::<Pkcs7>(artifact)
            .map_err(|_| TransformError::Format {
                reason: "blowfish padding is invalid: wrong key or corrupted artifact"
                    .to_string(),
            })?;
        require_utf8(&plaintext, "decrypted plaintext")?;
        Ok(plaintext)
    }
}

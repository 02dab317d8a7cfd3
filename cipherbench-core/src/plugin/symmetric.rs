// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Symmetric AEAD plugins: AES-256-GCM, ChaCha20-Poly1305, XChaCha20-Poly1305.
//!
//! Artifact format (binary):
//! ```text
//! [nonce: 12 bytes (24 for XChaCha)][N bytes: ciphertext][16 bytes: tag]
//! ```

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use rand::rngs::OsRng;
use rand::RngCore;

use super::{require_utf8, TransformPlugin, Transformed};
use crate::error::{TransformError, TransformResult};
use crate::keys::KeyMaterial;
use crate::types::AlgorithmId;

/// AES-256-GCM plugin.
pub type AesGcmPlugin = AeadPlugin<Aes256Gcm>;
/// ChaCha20-Poly1305 plugin.
pub type ChaCha20Poly1305Plugin = AeadPlugin<ChaCha20Poly1305>;
/// XChaCha20-Poly1305 plugin.
pub type XChaCha20Poly1305Plugin = AeadPlugin<XChaCha20Poly1305>;

/// Nonce-prefixed AEAD over any RustCrypto cipher.
pub struct AeadPlugin<C> {
    algorithm: AlgorithmId,
    cipher: C,
}

impl<C> AeadPlugin<C>
where
    C: Aead + KeyInit,
{
    /// Build from key-store material; only symmetric keys are accepted.
    pub fn new(algorithm: AlgorithmId, material: &KeyMaterial) -> TransformResult<Self> {
        match material {
            KeyMaterial::Symmetric(key) => Self::with_key(algorithm, key.as_bytes()),
            other => Err(TransformError::KeyUnavailable {
                algorithm,
                reason: format!("expected symmetric key, found {}", other.kind()),
            }),
        }
    }

    /// Build from raw key bytes (used by key-agreement plugins).
    pub fn with_key(algorithm: AlgorithmId, key: &[u8]) -> TransformResult<Self> {
        let cipher = C::new_from_slice(key).map_err(|_| TransformError::KeyUnavailable {
            algorithm,
            reason: format!("invalid key length: {} bytes", key.len()),
        })?;
        Ok(Self { algorithm, cipher })
    }

    /// Bytes added to the plaintext length by framing and tag.
    pub fn overhead() -> usize {
        <C::NonceSize as Unsigned>::USIZE + <C::TagSize as Unsigned>::USIZE
    }

    /// Encrypt under a fresh random nonce; returns `nonce || ciphertext || tag`.
    pub(crate) fn seal(&self, plaintext: &[u8]) -> TransformResult<Vec<u8>> {
        let mut nonce = Nonce::<C>::default();
        OsRng.fill_bytes(&mut nonce);

        let ciphertext =
            self.cipher
                .encrypt(&nonce, plaintext)
                .map_err(|e| TransformError::Cipher {
                    algorithm: self.algorithm,
                    reason: format!("encryption failed: {}", e),
                })?;

        let mut artifact = Vec::with_capacity(nonce.len() + ciphertext.len());
        artifact.extend_from_slice(&nonce);
        artifact.extend_from_slice(&ciphertext);
        Ok(artifact)
    }

    /// Split the nonce off and authenticate-decrypt the rest.
    pub(crate) fn open(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
        let nonce_len = <C::NonceSize as Unsigned>::USIZE;
        if artifact.len() < Self::overhead() {
            return Err(TransformError::Format {
                reason: format!(
                    "{} artifact too short: {} bytes (minimum {})",
                    self.algorithm,
                    artifact.len(),
                    Self::overhead()
                ),
            });
        }

        let (nonce, ciphertext) = artifact.split_at(nonce_len);
        self.cipher
            .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
            .map_err(|_| TransformError::Integrity {
                reason: format!(
                    "{} authentication failed: wrong key or corrupted artifact",
                    self.algorithm
                ),
            })
    }
}

impl<C> TransformPlugin for AeadPlugin<C>
where
    C: Aead + KeyInit + Send + Sync,
{
    fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed> {
        require_utf8(plaintext, "plaintext")?;
        self.seal(plaintext).map(Transformed::new)
    }

    fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
        let plaintext = self.open(artifact)?;
        require_utf8(&plaintext, "decrypted plaintext")?;
        Ok(plaintext)
    }
}

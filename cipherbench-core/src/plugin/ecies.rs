// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! ECIES over P-256.
//!
//! Each message uses a fresh ephemeral key; the shared X coordinate is run
//! through HKDF-SHA256 to key AES-256-GCM.
//!
//! Artifact format (binary):
//! ```text
//! [65 bytes: ephemeral SEC1 uncompressed point][12 bytes: nonce][ciphertext][16 bytes: tag]
//! ```

use aes_gcm::Aes256Gcm;
use hkdf::Hkdf;
use p256::ecdh::{diffie_hellman, EphemeralSecret};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use super::{require_utf8, AeadPlugin, TransformPlugin, Transformed};
use crate::error::{TransformError, TransformResult};
use crate::keys::{KeyMaterial, SYMMETRIC_KEY_SIZE};
use crate::types::AlgorithmId;

/// Length of an uncompressed SEC1 P-256 point.
const POINT_LEN: usize = 65;
const HKDF_INFO: &[u8] = b"cipherbench ecies p256 aes-256-gcm";

/// Ephemeral-static ECDH + AES-256-GCM.
pub struct EciesP256Plugin {
    recipient: SecretKey,
    recipient_public: PublicKey,
}

impl EciesP256Plugin {
    pub fn new(material: &KeyMaterial) -> TransformResult<Self> {
        match material {
            KeyMaterial::EcdhRecipient(secret) => Ok(Self {
                recipient: secret.clone(),
                recipient_public: secret.public_key(),
            }),
            other => Err(TransformError::KeyUnavailable {
                algorithm: AlgorithmId::EccP256,
                reason: format!("expected ECDH recipient key, found {}", other.kind()),
            }),
        }
    }

    fn data_cipher(shared_x: &[u8]) -> TransformResult<AeadPlugin<Aes256Gcm>> {
        let hkdf = Hkdf::<Sha256>::new(None, shared_x);
        let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
        hkdf.expand(HKDF_INFO, &mut okm)
            .map_err(|e| TransformError::Cipher {
                algorithm: AlgorithmId::EccP256,
                reason: format!("HKDF expand failed: {}", e),
            })?;
        AeadPlugin::with_key(AlgorithmId::EccP256, &okm)
    }
}

impl TransformPlugin for EciesP256Plugin {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::EccP256
    }

    fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed> {
        require_utf8(plaintext, "plaintext")?;

        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let ephemeral_point = ephemeral.public_key().to_encoded_point(false);
        let shared = ephemeral.diffie_hellman(&self.recipient_public);

        let sealed = Self::data_cipher(shared.raw_secret_bytes().as_slice())?.seal(plaintext)?;

        let mut artifact = Vec::with_capacity(POINT_LEN + sealed.len());
        artifact.extend_from_slice(ephemeral_point.as_bytes());
        artifact.extend_from_slice(&sealed);
        Ok(Transformed::new(artifact))
    }

    fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
        if artifact.len() < POINT_LEN + AeadPlugin::<Aes256Gcm>::overhead() {
            return Err(TransformError::Format {
                reason: format!(
                    "ecc-p256 artifact too short: {} bytes (minimum {})",
                    artifact.len(),
                    POINT_LEN + AeadPlugin::<Aes256Gcm>::overhead()
                ),
            });
        }

        let (point, sealed) = artifact.split_at(POINT_LEN);
        let ephemeral_public =
            PublicKey::from_sec1_bytes(point).map_err(|_| TransformError::Format {
                reason: "ecc-p256 artifact carries an invalid ephemeral public key".to_string(),
            })?;

        let shared = diffie_hellman(
            self.recipient.to_nonzero_scalar(),
            ephemeral_public.as_affine(),
        );
        let plaintext = Self::data_cipher(shared.raw_secret_bytes().as_slice())?.open(sealed)?;
        require_utf8(&plaintext, "decrypted plaintext")?;
        Ok(plaintext)
    }
}

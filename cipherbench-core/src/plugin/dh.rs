// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Finite-field Diffie-Hellman key agreement feeding AES-256-GCM.
//!
//! The initiator encrypts under SHA-256 of its view of the shared secret;
//! the responder decrypts under SHA-256 of its own view. Agreement happens
//! once, when the plugin is built.

use aes_gcm::Aes256Gcm;
use sha2::{Digest, Sha256};

use super::{require_utf8, AeadPlugin, TransformPlugin, Transformed};
use crate::error::{TransformError, TransformResult};
use crate::keys::{DhParties, KeyMaterial};
use crate::types::AlgorithmId;

pub struct DiffieHellmanPlugin {
    initiator: AeadPlugin<Aes256Gcm>,
    responder: AeadPlugin<Aes256Gcm>,
}

impl DiffieHellmanPlugin {
    pub fn new(material: &KeyMaterial) -> TransformResult<Self> {
        let KeyMaterial::DiffieHellman(parties) = material else {
            return Err(TransformError::KeyUnavailable {
                algorithm: AlgorithmId::DiffieHellman,
                reason: format!("expected DH parties, found {}", material.kind()),
            });
        };

        let (initiator_key, responder_key) = Self::derive_keys(parties);
        Ok(Self {
            initiator: AeadPlugin::with_key(AlgorithmId::DiffieHellman, &initiator_key)?,
            responder: AeadPlugin::with_key(AlgorithmId::DiffieHellman, &responder_key)?,
        })
    }

    fn derive_keys(parties: &DhParties) -> ([u8; 32], [u8; 32]) {
        let initiator_secret = parties
            .initiator
            .agree(&parties.group, parties.responder.public());
        let responder_secret = parties
            .responder
            .agree(&parties.group, parties.initiator.public());

        (
            Sha256::digest(&initiator_secret).into(),
            Sha256::digest(&responder_secret).into(),
        )
    }
}

impl TransformPlugin for DiffieHellmanPlugin {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::DiffieHellman
    }

    fn transform(&self, plaintext: &[u8]) -> TransformResult<Transformed> {
        require_utf8(plaintext, "plaintext")?;
        self.initiator.seal(plaintext).map(Transformed::new)
    }

    fn inverse(&self, artifact: &[u8]) -> TransformResult<Vec<u8>> {
        let plaintext = self.responder.open(artifact)?;
        require_utf8(&plaintext, "decrypted plaintext")?;
        Ok(plaintext)
    }
}

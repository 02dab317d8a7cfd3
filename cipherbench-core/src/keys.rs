// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Key material owned by the key store.
//!
//! Plugins never reach for a global key: each plugin instance receives an
//! `Arc<KeyMaterial>` at construction. Rotating a key replaces the store
//! entry; plugins built afterwards pick up the new material.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use num_bigint::{BigUint, RandBigInt};
use p256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::TransformError;
use crate::types::AlgorithmId;

/// Size of every symmetric key in bytes (256-bit).
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Bits of the private exponent drawn for finite-field DH.
const DH_EXPONENT_BITS: u64 = 256;

/// RFC 3526 group 14 (2048-bit MODP) prime, hex encoded.
const MODP_2048_PRIME: &[u8] = b"\
FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
83655D23DCA3AD961C62F356208552BB9ED529077096966D\
670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
15728E5A8AACAA68FFFFFFFFFFFFFFFF";

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Draw a fresh key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Finite-field Diffie-Hellman group parameters.
#[derive(Debug, Clone)]
pub struct DhGroup {
    pub prime: BigUint,
    pub generator: BigUint,
}

impl DhGroup {
    /// The 2048-bit MODP group with generator 2.
    pub fn modp_2048() -> Self {
        Self {
            // The constant is valid hex; parse cannot fail.
            prime: BigUint::parse_bytes(MODP_2048_PRIME, 16).unwrap_or_default(),
            generator: BigUint::from(2u32),
        }
    }

    /// Byte length of an encoded group element.
    pub fn element_len(&self) -> usize {
        ((self.prime.bits() + 7) / 8) as usize
    }
}

/// One party's DH key pair.
pub struct DhKeyPair {
    private: BigUint,
    public: BigUint,
}

impl DhKeyPair {
    pub fn generate(group: &DhGroup) -> Self {
        let private = OsRng.gen_biguint(DH_EXPONENT_BITS) + 2u32;
        let public = group.generator.modpow(&private, &group.prime);
        Self { private, public }
    }

    pub fn public(&self) -> &BigUint {
        &self.public
    }

    /// Shared secret with a peer's public value, fixed-width big-endian.
    pub fn agree(&self, group: &DhGroup, peer_public: &BigUint) -> Vec<u8> {
        let shared = peer_public.modpow(&self.private, &group.prime);
        let raw = shared.to_bytes_be();
        let mut encoded = vec![0u8; group.element_len().saturating_sub(raw.len())];
        encoded.extend_from_slice(&raw);
        encoded
    }
}

impl std::fmt::Debug for DhKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhKeyPair")
            .field("private", &"[REDACTED]")
            .field("public_bits", &self.public.bits())
            .finish()
    }
}

/// Both parties of a DH exchange, owned by the benchmark.
#[derive(Debug)]
pub struct DhParties {
    pub group: DhGroup,
    pub initiator: DhKeyPair,
    pub responder: DhKeyPair,
}

impl DhParties {
    pub fn generate() -> Self {
        let group = DhGroup::modp_2048();
        let initiator = DhKeyPair::generate(&group);
        let responder = DhKeyPair::generate(&group);
        Self {
            group,
            initiator,
            responder,
        }
    }
}

/// Long-lived key material for one algorithm.
#[derive(Debug)]
pub enum KeyMaterial {
    Symmetric(SymmetricKey),
    EcdhRecipient(SecretKey),
    DiffieHellman(DhParties),
}

impl KeyMaterial {
    /// Fresh material of the shape the algorithm expects.
    pub fn generate_for(algorithm: AlgorithmId) -> Self {
        match algorithm {
            AlgorithmId::AesGcm
            | AlgorithmId::ChaCha20Poly1305
            | AlgorithmId::XChaCha20Poly1305
            | AlgorithmId::Blowfish => Self::Symmetric(SymmetricKey::generate()),
            AlgorithmId::EccP256 => Self::EcdhRecipient(SecretKey::random(&mut OsRng)),
            AlgorithmId::DiffieHellman => Self::DiffieHellman(DhParties::generate()),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Symmetric(_) => "symmetric",
            Self::EcdhRecipient(_) => "ecdh-recipient",
            Self::DiffieHellman(_) => "diffie-hellman",
        }
    }
}

/// Owner of every algorithm's key material.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<AlgorithmId, Arc<KeyMaterial>>>,
}

impl KeyStore {
    /// Create a store with no material.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a store with fresh material for every built-in algorithm.
    pub fn generate() -> Self {
        let store = Self::empty();
        for algorithm in AlgorithmId::ALL {
            store.insert(algorithm, KeyMaterial::generate_for(algorithm));
        }
        store
    }

    /// Install material for an algorithm, replacing any previous entry.
    pub fn insert(&self, algorithm: AlgorithmId, material: KeyMaterial) {
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        keys.insert(algorithm, Arc::new(material));
    }

    /// Material for an algorithm.
    pub fn get(&self, algorithm: AlgorithmId) -> Result<Arc<KeyMaterial>, TransformError> {
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());
        keys.get(&algorithm)
            .cloned()
            .ok_or_else(|| TransformError::KeyUnavailable {
                algorithm,
                reason: "no key material in key store".to_string(),
            })
    }

    /// Replace an algorithm's material with freshly generated material.
    pub fn rotate(&self, algorithm: AlgorithmId) {
        tracing::info!(algorithm = %algorithm, "Rotating key material");
        self.insert(algorithm, KeyMaterial::generate_for(algorithm));
    }

    pub fn contains(&self, algorithm: AlgorithmId) -> bool {
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());
        keys.contains_key(&algorithm)
    }
}

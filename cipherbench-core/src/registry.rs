//! Thread-safe plugin registry using DashMap.
//!
//! Maps an algorithm identifier to a constructor. Plugins are resolved once,
//! when a sweep starts, never per call.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{BenchError, BenchResult, TransformResult};
use crate::keys::KeyStore;
use crate::plugin::{
    AesGcmPlugin, BlowfishPlugin, ChaCha20Poly1305Plugin, DiffieHellmanPlugin, EciesP256Plugin,
    TransformPlugin, XChaCha20Poly1305Plugin,
};
use crate::types::AlgorithmId;

/// Builds a plugin instance from the key store.
pub type PluginConstructor =
    Arc<dyn Fn(&KeyStore) -> TransformResult<Box<dyn TransformPlugin>> + Send + Sync>;

/// Registry of transform plugin constructors.
pub struct PluginRegistry {
    constructors: DashMap<AlgorithmId, PluginConstructor>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            constructors: DashMap::new(),
        }
    }

    /// Create a registry with every built-in plugin.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        for algorithm in AlgorithmId::ALL {
            let constructor: PluginConstructor =
                Arc::new(move |keys: &KeyStore| build_builtin(algorithm, keys));
            registry.constructors.insert(algorithm, constructor);
        }
        registry
    }

    /// Register a constructor.
    /// Fails if the algorithm already has one.
    pub fn register(
        &self,
        algorithm: AlgorithmId,
        constructor: PluginConstructor,
    ) -> BenchResult<()> {
        // Check for duplicate - fail fast
        if self.constructors.contains_key(&algorithm) {
            return Err(BenchError::PluginAlreadyRegistered(algorithm));
        }

        self.constructors.insert(algorithm, constructor);
        Ok(())
    }

    /// Unregister an algorithm's constructor.
    pub fn unregister(&self, algorithm: AlgorithmId) -> BenchResult<()> {
        self.constructors
            .remove(&algorithm)
            .map(|_| ())
            .ok_or(BenchError::PluginNotRegistered(algorithm))
    }

    /// Build a plugin instance for an algorithm.
    pub fn resolve(
        &self,
        algorithm: AlgorithmId,
        keys: &KeyStore,
    ) -> BenchResult<Arc<dyn TransformPlugin>> {
        let constructor = self
            .constructors
            .get(&algorithm)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(BenchError::PluginNotRegistered(algorithm))?;

        let plugin = constructor(keys)?;
        tracing::debug!(algorithm = %algorithm, "Resolved transform plugin");
        Ok(Arc::from(plugin))
    }

    /// Check if an algorithm has a constructor.
    pub fn contains(&self, algorithm: AlgorithmId) -> bool {
        self.constructors.contains_key(&algorithm)
    }

    /// Get the number of registered algorithms.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered algorithm ids, sorted.
    pub fn algorithms(&self) -> Vec<AlgorithmId> {
        let mut ids: Vec<_> = self.constructors.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }
}

/// Construct a built-in plugin from the store's material for `algorithm`.
pub fn build_builtin(
    algorithm: AlgorithmId,
    keys: &KeyStore,
) -> TransformResult<Box<dyn TransformPlugin>> {
    let material = keys.get(algorithm)?;
    let plugin: Box<dyn TransformPlugin> = match algorithm {
        AlgorithmId::AesGcm => Box::new(AesGcmPlugin::new(algorithm, &material)?),
        AlgorithmId::ChaCha20Poly1305 => {
            Box::new(ChaCha20Poly1305Plugin::new(algorithm, &material)?)
        }
        AlgorithmId::XChaCha20Poly1305 => {
            Box::new(XChaCha20Poly1305Plugin::new(algorithm, &material)?)
        }
        AlgorithmId::EccP256 => Box::new(EciesP256Plugin::new(&material)?),
        AlgorithmId::DiffieHellman => Box::new(DiffieHellmanPlugin::new(&material)?),
        AlgorithmId::Blowfish => Box::new(BlowfishPlugin::new(&material)?),
    };
    Ok(plugin)
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}

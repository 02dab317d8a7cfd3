//! cipherbench Core Library
//!
//! Core library for the cipherbench encryption benchmark.
//! Provides validated types, configuration parsing, key material,
//! transform plugins and their registry, the payload store, entropy
//! analysis, and the pipeline state machine.

pub mod config;
pub mod entropy;
pub mod error;
pub mod keys;
pub mod payload;
pub mod plugin;
pub mod registry;
pub mod state;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::{
    BenchmarkConfig, Config, ConfigLoader, MetricsConfig, SamplerConfig, StoreConfig, SweepConfig,
};
pub use entropy::shannon_entropy;
pub use error::{
    BenchError, BenchResult, HardValidationError, StateTransitionError, StoreError, StoreResult,
    TransformError, TransformResult,
};
pub use keys::{KeyMaterial, KeyStore};
pub use plugin::{TransformPlugin, Transformed};
pub use registry::PluginRegistry;
pub use state::{PipelineState, PipelineStateMachine};
pub use storage::{FileStore, MemoryStore, PayloadStore};
pub use types::{AlgorithmId, IterationCount, Label, Operation};

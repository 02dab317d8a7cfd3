//! Custom error types for cipherbench.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::AlgorithmId;

/// Top-level error type for the cipherbench core library.
/// All errors are explicit variants - no catch-all or generic handling.
#[derive(Debug, Error)]
pub enum BenchError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Pipeline State Machine Errors
    // =========================================================================
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    // =========================================================================
    // Plugin Registry Errors
    // =========================================================================
    #[error("No transform plugin registered for algorithm: {0}")]
    PluginNotRegistered(AlgorithmId),

    #[error("Transform plugin already registered for algorithm: {0}")]
    PluginAlreadyRegistered(AlgorithmId),

    // =========================================================================
    // Transform and Store Errors
    // =========================================================================
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors abort startup.
/// Used when configuration is invalid and a sweep cannot safely begin.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown algorithm: {name}")]
    UnknownAlgorithm { name: String },

    #[error("Duplicate entry in {field}: {value}")]
    DuplicateEntry { field: &'static str, value: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// State transition errors for the pipeline state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} for run {run}")]
    InvalidTransition {
        run: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Run {run} is in terminal state: {state}")]
    TerminalState { run: String, state: &'static str },
}

/// Errors raised by a transform plugin.
///
/// The orchestrator branches on the variant, never on the message.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Input is not valid for the plugin (plaintext must be UTF-8 text).
    #[error("Encoding error: {reason}")]
    Encoding { reason: String },

    /// Authentication tag or round-trip verification failed.
    #[error("Integrity check failed: {reason}")]
    Integrity { reason: String },

    /// Artifact is structurally malformed (length, framing, embedded key).
    #[error("Malformed artifact: {reason}")]
    Format { reason: String },

    #[error("Key material unavailable for {algorithm}: {reason}")]
    KeyUnavailable {
        algorithm: AlgorithmId,
        reason: String,
    },

    #[error("Cipher failure in {algorithm}: {reason}")]
    Cipher {
        algorithm: AlgorithmId,
        reason: String,
    },
}

/// Errors raised by the payload store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable during {operation}: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

impl StoreError {
    /// Wrap an IO failure from a store backend.
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Unavailable {
            operation,
            reason: source.to_string(),
        }
    }
}

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;

/// Result type alias for plugin calls.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for the FGI simulator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole simulator.
///
/// Provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. No variant is fatal to a
/// session: the operator may always retry the failed command.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FgiError {
    /// Malformed operator input (empty persona name, empty stimulus, ...).
    /// No state is mutated when this is returned.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A phase-transition or phase-gating guard was violated.
    /// No state is mutated when this is returned.
    #[error("Precondition error: {0}")]
    Precondition(String),

    /// The external generation backend failed for a specific speaker/step.
    #[error("Generation failed for {speaker}: {message}")]
    Generation { speaker: String, message: String },

    /// IO error (export file writing)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FgiError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates a Generation error for the given speaker
    pub fn generation(speaker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            speaker: speaker.into(),
            message: message.into(),
        }
    }

    /// Creates a Serialization error for the given format
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a Generation error
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }
}

impl From<std::io::Error> for FgiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FgiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, FgiError>`.
pub type Result<T> = std::result::Result<T, FgiError>;

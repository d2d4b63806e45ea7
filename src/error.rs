//! Unified error hierarchy for vitalrs
//!
//! Aggregates the typed errors of the configuration, storage, provider, and
//! pipeline layers into a single crate-level error with severity
//! classification and tracing integration.

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::ComputeError;
use crate::provider::ProviderError;
use crate::storage::StorageError;

/// Top-level error type for all vitalrs operations
#[derive(Debug, Error)]
pub enum VitalrsError {
    /// Scoring configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local metric storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Platform health-store read errors
    #[error("Health data provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Pipeline precondition errors
    #[error("Computation error: {0}")]
    Compute(#[from] ComputeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for vitalrs operations
pub type Result<T> = std::result::Result<T, VitalrsError>;

impl VitalrsError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, VitalrsError::Provider(_) | VitalrsError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VitalrsError::Compute(_) => ErrorSeverity::Warning,
            VitalrsError::Provider(_) => ErrorSeverity::Warning,
            VitalrsError::Storage(_) => ErrorSeverity::Error,
            VitalrsError::Config(_) => ErrorSeverity::Critical,
            VitalrsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            VitalrsError::Compute(ComputeError::NoUserProfile) => {
                "Set up your profile before metrics can be computed.".to_string()
            }
            VitalrsError::Compute(ComputeError::InsufficientData(what)) => {
                format!(
                    "Not enough data to compute {}. Wear your device a few more days.",
                    what
                )
            }
            VitalrsError::Provider(_) => {
                "Could not read health data from the platform store.".to_string()
            }
            VitalrsError::Storage(_) => {
                "Unable to access local metric storage. Please check your device storage."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

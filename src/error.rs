//! Error types for storage distribution
//!
//! Provides structured error types for resolution, input validation,
//! document loading, and the cloud driver boundary.

use crate::distribution::allocator::CapacityShortfall;
use crate::distribution::engine::RowAttempt;
use crate::distribution::matrix::RowId;
use crate::domain::ports::StorageError;
use thiserror::Error;

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error(
        "No matching decision matrix rows for spec {spec_index}: instance type {instance_type}, region {}, iops >= {iops}",
        .region.as_deref().unwrap_or("<any>")
    )]
    NoMatchingRows {
        spec_index: usize,
        instance_type: String,
        region: Option<String>,
        iops: u64,
    },

    #[error("Capacity unsatisfiable with row {row}: {reason}")]
    CapacityUnsatisfiable { row: RowId, reason: CapacityShortfall },

    #[error(
        "No feasible configuration for spec {spec_index} after {} candidate rows: {}",
        .attempts.len(),
        display_attempts(.attempts)
    )]
    NoFeasibleConfiguration {
        spec_index: usize,
        attempts: Vec<RowAttempt>,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid decision matrix row {row}: {reason}")]
    InvalidMatrix { row: usize, reason: String },

    // =========================================================================
    // Driver Errors
    // =========================================================================
    #[error("Storage driver error: {0}")]
    Storage(#[from] StorageError),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    // =========================================================================
    // Configuration / Parse Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_attempts(attempts: &[RowAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("[{}: {}]", a.row, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoMatchingRows { .. } => "NoMatchingRows",
            Error::CapacityUnsatisfiable { .. } => "CapacityUnsatisfiable",
            Error::NoFeasibleConfiguration { .. } => "NoFeasibleConfiguration",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::InvalidMatrix { .. } => "InvalidMatrix",
            Error::Storage(_) => "Storage",
            Error::Unsupported(_) => "Unsupported",
            Error::Configuration(_) => "Configuration",
            Error::Yaml(_) => "Yaml",
            Error::Json(_) => "Json",
            Error::Io(_) => "Io",
        }
    }

    /// Index of the capacity spec this error is scoped to, if any
    pub fn spec_index(&self) -> Option<usize> {
        match self {
            Error::NoMatchingRows { spec_index, .. }
            | Error::NoFeasibleConfiguration { spec_index, .. } => Some(*spec_index),
            _ => None,
        }
    }

    /// Check if retrying the same call could succeed.
    ///
    /// Resolution runs over static inputs, so only IO failures are retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

//! Unified error handling for divegps.
//!
//! The merge pass itself never fails; these errors belong to the layers
//! around it (loading dive logs and fixes, validating configuration).

use std::path::PathBuf;

use thiserror::Error;

use crate::Timestamp;

/// Errors produced while preparing inputs for a merge.
#[derive(Debug, Error)]
pub enum DiveGpsError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dive log, fix list or config file was not valid JSON for its schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A merge configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fix was constructed with coordinates outside the valid range.
    #[error("fix at {when} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        when: Timestamp,
        latitude: f64,
        longitude: f64,
    },
}

/// Result type for divegps operations.
pub type Result<T> = std::result::Result<T, DiveGpsError>;


use std::path::PathBuf;

use thiserror::Error;

/// Result type for fund computations and reference-data loading
pub type Result<T> = std::result::Result<T, FundError>;

/// Errors that stop a computation before any total is produced.
///
/// Compliance violations are not errors: they come back as
/// [`crate::core::ComplianceCheck`] diagnostics next to a successful result.
#[derive(Error, Debug)]
pub enum FundError {
    /// No reference table was configured
    #[error("Reference data unavailable: the fund cannot be computed without it")]
    ReferenceDataUnavailable,

    /// Reference table loaded but unusable
    #[error("Invalid reference data: {0}")]
    InvalidReferenceData(String),

    /// Input snapshot rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FundError {
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReferenceData(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

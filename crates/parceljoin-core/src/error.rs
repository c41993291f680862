//! Error types for parceljoin

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParceljoinError {
    // Input errors
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported input format for {path}. Supported extensions: {supported}")]
    UnsupportedFormat { path: PathBuf, supported: String },

    #[error("Invalid {format} document: {reason}")]
    FormatValidation { format: String, reason: String },

    #[error("Dataset is empty: {what}")]
    EmptyDataset { what: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ParceljoinError {
    /// Shorthand for a structurally invalid input document
    pub fn invalid(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FormatValidation { format: format.into(), reason: reason.into() }
    }
}

impl From<serde_json::Error> for ParceljoinError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParceljoinError>;

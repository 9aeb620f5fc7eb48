//! Core error types for breakroom-core.
//!
//! The session itself never fails: external-query problems degrade to
//! safe defaults per the probe contracts. Errors here belong to the
//! storage layer (config and break-log files) and to value validation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breakroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Break log errors
    #[error("Break log error: {0}")]
    Log(#[from] LogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Break-log storage errors.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to read break log at {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Failed to write break log at {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    #[error("Break log at {path} is not valid JSON: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Result type alias using [`CoreError`] by default.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

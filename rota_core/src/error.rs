//! Error types for the rota_core library.
//!
//! Booking conflicts and unknown professionals are not errors: booking
//! operations report them as `false` with no state change. `Error` covers
//! the persistence and configuration surfaces.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rota_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State file error
    #[error("Persistence error: {0}")]
    Persistence(String),
}

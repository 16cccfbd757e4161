//! Error types for the simulation harness.

use calomatch_core::{ConfigError, ResolveError};
use calomatch_env::EnvError;
use thiserror::Error;

/// Errors raised by the harness itself (not by a scored pass).
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading a generated event failed
    #[error("Event error: {0}")]
    Env(#[from] EnvError),

    /// A resolution pass failed
    #[error("Resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Strategy settings were rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export or settings file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

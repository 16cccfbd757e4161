//! Resolver configuration and settings-block parsing.
//!
//! A host hands each pass one textual settings block. The Force-Split
//! Resolver reads it as TOML; the Truth Matcher has no settings and ignores
//! whatever keys the block carries.
//!
//! ```toml
//! min_track_associations = 2
//! b_field_tesla = 3.5
//! max_reassignment_distance = 150.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or validating settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The block is not valid TOML or has unknown keys
    #[error("Malformed settings: {0}")]
    Malformed(String),

    /// A value is outside its allowed range
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// Strategy name not recognised
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// Configuration for the ForceSplitResolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForceSplitConfig {
    /// Number of tracks a cluster may carry before it is force-resolved (default: 1).
    /// Zero resolves every associated cluster.
    pub min_track_associations: u32,

    /// Solenoid field strength for helix propagation (default: 3.5 T)
    pub b_field_tesla: f64,

    /// Candidate clusters farther than this from a helix are ignored (default: unlimited)
    pub max_reassignment_distance: Option<f64>,
}

impl Default for ForceSplitConfig {
    fn default() -> Self {
        Self {
            min_track_associations: 1,
            b_field_tesla: 3.5,
            max_reassignment_distance: None,
        }
    }
}

impl ForceSplitConfig {
    /// Parses and validates a settings block. Missing keys take defaults.
    pub fn from_settings(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the track tolerance.
    pub fn with_min_track_associations(mut self, n: u32) -> Self {
        self.min_track_associations = n;
        self
    }

    /// Sets the field strength.
    pub fn with_b_field(mut self, tesla: f64) -> Self {
        self.b_field_tesla = tesla;
        self
    }

    /// Limits how far a track may be moved.
    pub fn with_max_reassignment_distance(mut self, mm: f64) -> Self {
        self.max_reassignment_distance = Some(mm);
        self
    }

    /// Checks every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.b_field_tesla.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "b_field_tesla",
                reason: format!("{} is not finite", self.b_field_tesla),
            });
        }
        if let Some(limit) = self.max_reassignment_distance {
            if limit.is_nan() || limit <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "max_reassignment_distance",
                    reason: format!("{} must be positive", limit),
                });
            }
        }
        Ok(())
    }
}

/// Top-level keys of a settings block, for strategies that read none.
///
/// The block must still be valid TOML.
pub fn setting_keys(text: &str) -> Result<Vec<String>, ConfigError> {
    let table: toml::Table =
        toml::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    Ok(table.keys().cloned().collect())
}

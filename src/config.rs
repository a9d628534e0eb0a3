//! Engine configuration.
//!
//! Defines sunset-nudge thresholds per tier and the persistence retry policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tier::Tier;

/// Days without deep contact before a core friend is nudged.
pub const CORE_SUNSET_DAYS: i64 = 7;
/// Days without deep contact before an inner friend is nudged.
pub const INNER_SUNSET_DAYS: i64 = 14;
/// Days without deep contact before an outer friend is nudged.
pub const OUTER_SUNSET_DAYS: i64 = 60;

/// Error returned for an unusable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Sunset-nudge tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunsetConfig {
    /// Maintenance threshold in days per tier. Tiers without an entry are
    /// never nudged.
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<Tier, i64>,

    /// Multiple of the threshold after which the suggested action escalates.
    /// Default: 2
    #[serde(default = "default_escalation_factor")]
    pub escalation_factor: i64,
}

fn default_thresholds() -> BTreeMap<Tier, i64> {
    [
        (Tier::Core, CORE_SUNSET_DAYS),
        (Tier::Inner, INNER_SUNSET_DAYS),
        (Tier::Outer, OUTER_SUNSET_DAYS),
    ]
    .into_iter()
    .collect()
}

const fn default_escalation_factor() -> i64 {
    2
}

impl Default for SunsetConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            escalation_factor: default_escalation_factor(),
        }
    }
}

impl SunsetConfig {
    /// Threshold for a tier. The acquainted tier never has one; it is
    /// batched by the acquainted scheduler instead.
    #[must_use]
    pub fn threshold_for(&self, tier: Tier) -> Option<i64> {
        if tier == Tier::Acquainted {
            return None;
        }
        self.thresholds.get(&tier).copied()
    }
}

/// Persistence tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceConfig {
    /// Attempts per save before the failure is logged and dropped.
    /// Default: 3
    #[serde(default = "default_save_attempts")]
    pub save_attempts: u32,
}

const fn default_save_attempts() -> u32 {
    3
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_attempts: default_save_attempts(),
        }
    }
}

/// Top-level engine configuration.
///
/// # Examples
///
/// ```
/// use dunbar_core::EngineConfig;
/// use dunbar_core::tier::Tier;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.sunset.threshold_for(Tier::Core), Some(7));
///
/// let config = EngineConfig::from_json_str(r#"{"sunset":{"thresholds":{"core":3}}}"#).unwrap();
/// assert_eq!(config.sunset.threshold_for(Tier::Core), Some(3));
/// assert_eq!(config.sunset.threshold_for(Tier::Inner), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Sunset-nudge tuning.
    #[serde(default)]
    pub sunset: SunsetConfig,
    /// Persistence tuning.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the sunset threshold of a tier.
    #[must_use]
    pub fn with_sunset_threshold(mut self, tier: Tier, days: i64) -> Self {
        self.sunset.thresholds.insert(tier, days);
        self
    }

    /// Sets the number of save attempts.
    #[must_use]
    pub const fn with_save_attempts(mut self, attempts: u32) -> Self {
        self.persistence.save_attempts = attempts;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for non-positive thresholds, an
    /// escalation factor below 1, or zero save attempts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((tier, days)) = self.sunset.thresholds.iter().find(|(_, &d)| d <= 0) {
            return Err(ConfigError::Invalid(format!(
                "sunset threshold for {tier} must be positive, got {days}"
            )));
        }
        if self.sunset.escalation_factor < 1 {
            return Err(ConfigError::Invalid(
                "escalation factor must be at least 1".to_string(),
            ));
        }
        if self.persistence.save_attempts == 0 {
            return Err(ConfigError::Invalid(
                "save attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration of the elimination pass.
//!
//! ```
//! use elim_applies::config::{ElimConfig, VerifyMode};
//!
//! let config = ElimConfig::from_toml_str("max_rounds = 16\nverify = \"always\"").unwrap();
//! assert_eq!(config.max_rounds, 16);
//! assert_eq!(config.verify, VerifyMode::Always);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bound on elimination rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 1024;

/// When the pass checks its invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    /// Never check.
    Off,
    /// Check in builds with debug assertions.
    #[default]
    Debug,
    /// Always check.
    Always,
}

impl VerifyMode {
    /// Returns `true` if checks run in this build.
    pub fn enabled(self) -> bool {
        match self {
            VerifyMode::Off => false,
            VerifyMode::Debug => cfg!(debug_assertions),
            VerifyMode::Always => true,
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("max_rounds must be at least 1")]
    ZeroRounds,
}

/// Options of `ApplyEliminator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElimConfig {
    /// Upper bound on rounds, counting the final empty round. `validate`
    /// rejects 0; `ApplyEliminator` raises it to 1.
    pub max_rounds: usize,
    /// Invariant checking.
    pub verify: VerifyMode,
}

impl Default for ElimConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            verify: VerifyMode::default(),
        }
    }
}

impl ElimConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a round bound of zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        Ok(())
    }

    /// Sets the round bound.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Sets when invariants are checked.
    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(ElimConfig::from_toml_str("").unwrap(), ElimConfig::default());
    }

    #[test]
    fn rejects_zero_rounds_and_unknown_keys() {
        assert!(matches!(
            ElimConfig::from_toml_str("max_rounds = 0"),
            Err(ConfigError::ZeroRounds)
        ));
        assert!(matches!(
            ElimConfig::from_toml_str("rounds = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn verify_mode_switches() {
        assert!(!VerifyMode::Off.enabled());
        assert!(VerifyMode::Always.enabled());
        assert_eq!(VerifyMode::Debug.enabled(), cfg!(debug_assertions));
    }
}

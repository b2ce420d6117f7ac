//! TOML-based configuration for CodeUnify.
//!
//! Everything has a sensible default, so running without a config file is
//! equivalent to loading an empty one. Command-line flags override loaded
//! values at the call site.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::Strategy;
use crate::errors::ConfigError;
use crate::validate::{ArtifactValidator, BalancedDelimiters, NoValidation};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Unification behaviour.
    #[serde(default)]
    pub unify: UnifyConfig,

    /// Structural validation of the unified output.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Unification behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnifyConfig {
    /// Default merge strategy when no flag is given.
    #[serde(default)]
    pub strategy: Strategy,
}

/// Which structural check runs against the unified output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Accept everything.
    None,
    /// Check bracket/brace/parenthesis balance.
    #[default]
    Delimiters,
}

/// Validation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub mode: ValidationMode,
}

impl ValidationConfig {
    /// Build the validator this configuration selects.
    pub fn validator(&self) -> Box<dyn ArtifactValidator> {
        match self.mode {
            ValidationMode::None => Box::new(NoValidation),
            ValidationMode::Delimiters => Box::new(BalancedDelimiters),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Suffix appended to the original path when no output path is given.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    ".unified".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Check value-level constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.suffix".to_string(),
                detail: "suffix must not be empty (the output would overwrite the original)"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// A commented default configuration, used by `codeunify init`.
    pub fn default_template() -> &'static str {
        r#"# CodeUnify configuration.

[unify]
# Merge strategy: conservative, aggressive, smart, or manual.
strategy = "smart"

[validation]
# Structural check on the unified output: none or delimiters.
mode = "delimiters"

[output]
# Suffix appended to the original path when --output is not given.
suffix = ".unified"
"#
    }
}

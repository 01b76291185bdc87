//! Flattening options, loadable from a TOML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{MachineError, Mode, Symbol};

/// Options for a single flattening run.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```toml
/// iteration = 2
/// mode = "strict"
/// placeholder = "~"
///
/// [safety]
/// left = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenConfig {
    /// Suffix of the head markers. Flattening an already flattened machine needs a new one.
    pub iteration: u32,
    pub mode: Mode,
    pub safety: SafetyConfig,
    /// Input symbol standing for a blank. When set, a pre-pass replaces it before the
    /// first simulated step.
    pub placeholder: Option<Symbol>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            iteration: 1,
            mode: Mode::default(),
            safety: SafetyConfig::default(),
            placeholder: None,
        }
    }
}

/// Which tape-extension subroutines get generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyConfig {
    pub left: bool,
    pub right: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            left: true,
            right: true,
        }
    }
}

impl FlattenConfig {
    /// Reads and validates a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MachineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, MachineError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| MachineError::ConfigError(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MachineError> {
        if self.iteration == 0 {
            return Err(MachineError::ConfigError(
                "iteration must be at least 1".into(),
            ));
        }

        if let Some(placeholder) = &self.placeholder {
            if placeholder.is_reserved() || placeholder.is_blank() || placeholder.as_str().is_empty() {
                return Err(MachineError::ConfigError(format!(
                    "'{placeholder}' cannot be used as a placeholder"
                )));
            }
        }

        Ok(())
    }
}

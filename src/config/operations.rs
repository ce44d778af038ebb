//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{Result, RuntimeError};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| RuntimeError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `cnab_root` and `mask` must be non-empty
    /// - a mixin `command` override must parse to at least one word
    pub fn validate(&self) -> Result<()> {
        if self.cnab_root.trim().is_empty() {
            return Err(RuntimeError::UserError(
                "config validation failed: cnab_root must not be empty".to_string(),
            ));
        }

        if self.mask.is_empty() {
            return Err(RuntimeError::UserError(
                "config validation failed: mask must not be empty".to_string(),
            ));
        }

        for (name, settings) in &self.mixins {
            let Some(command) = &settings.command else {
                continue;
            };
            let words = shell_words::split(command).map_err(|e| {
                RuntimeError::UserError(format!(
                    "config validation failed: mixin '{}' has an unparseable command '{}': {}",
                    name, command, e
                ))
            })?;
            if words.is_empty() {
                return Err(RuntimeError::UserError(format!(
                    "config validation failed: mixin '{}' has an empty command",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Directory where mixin executables are installed.
    pub fn resolved_mixins_dir(&self) -> PathBuf {
        match &self.mixins_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.cnab_root).join("app").join("mixins"),
        }
    }
}

//! # Engine Configuration
//!
//! `EngineConfig` holds the search limits and the default Sosa root.
//!
//! Sources, lowest precedence first:
//! 1. Compiled-in defaults (`primitives`)
//! 2. A TOML file (`EngineConfig::load`)
//! 3. `LINEAGE_*` environment variables (`apply_env_overrides`)
//! 4. Values the host sets on the struct afterwards
//!
//! ```toml
//! max_depth = 20
//! max_distance = 40
//! default_root = "I0001"
//! distinguish_depth_exceeded = false
//! ```

use crate::primitives::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_DISTANCE, ENV_DISTINGUISH_DEPTH_EXCEEDED, ENV_MAX_DEPTH,
    ENV_MAX_DISTANCE, ENV_SOSA_ROOT, MAX_ANCESTOR_DEPTH, MAX_PATH_DISTANCE,
};
use crate::{ClassifyOptions, LineageError, PersonKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Parent edges climbed per subject when classifying.
    pub max_depth: u32,

    /// Edges allowed in a relationship path.
    pub max_distance: u32,

    /// Root used by `sosa_of_default_root`.
    pub default_root: Option<PersonKey>,

    /// Report `DepthExceeded` instead of `Unrelated` when a search was cut off.
    pub distinguish_depth_exceeded: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_distance: DEFAULT_MAX_DISTANCE,
            default_root: None,
            distinguish_depth_exceeded: false,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, LineageError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| LineageError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LineageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LineageError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, LineageError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.apply_env_overrides()
    }

    /// Overlay the `LINEAGE_*` environment variables.
    pub fn apply_env_overrides(self) -> Result<Self, LineageError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from any variable source.
    ///
    /// Empty values are ignored. The result is validated.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LineageError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_MAX_DEPTH) {
            self.max_depth = parse_limit(ENV_MAX_DEPTH, &value)?;
        }
        if let Some(value) = read(ENV_MAX_DISTANCE) {
            self.max_distance = parse_limit(ENV_MAX_DISTANCE, &value)?;
        }
        if let Some(value) = read(ENV_SOSA_ROOT) {
            self.default_root = Some(PersonKey::new(value));
        }
        if let Some(value) = read(ENV_DISTINGUISH_DEPTH_EXCEEDED) {
            self.distinguish_depth_exceeded = parse_flag(ENV_DISTINGUISH_DEPTH_EXCEEDED, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check every limit is positive and under its hard cap.
    pub fn validate(&self) -> Result<(), LineageError> {
        if self.max_depth == 0 || self.max_depth > MAX_ANCESTOR_DEPTH {
            return Err(LineageError::Config(format!(
                "max_depth must be between 1 and {MAX_ANCESTOR_DEPTH}, got {}",
                self.max_depth
            )));
        }
        if self.max_distance == 0 || self.max_distance > MAX_PATH_DISTANCE {
            return Err(LineageError::Config(format!(
                "max_distance must be between 1 and {MAX_PATH_DISTANCE}, got {}",
                self.max_distance
            )));
        }
        if self
            .default_root
            .as_ref()
            .is_some_and(|root| root.as_str().is_empty())
        {
            return Err(LineageError::Config("default_root cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Classification options derived from this config.
    #[must_use]
    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            max_depth: self.max_depth,
            distinguish_depth_exceeded: self.distinguish_depth_exceeded,
        }
    }
}

fn parse_limit(name: &str, value: &str) -> Result<u32, LineageError> {
    value
        .parse()
        .map_err(|_| LineageError::Config(format!("{name} must be a positive integer, got {value:?}")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, LineageError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LineageError::Config(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}

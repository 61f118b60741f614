//! Relay settings: defaults, overridden by a YAML file, overridden by flags.

use crate::relay::DEFAULT_ENDPOINT;
use anyhow::{bail, Context, Result};
use gesture_common::pointer::{DEFAULT_SENSITIVITY, MAX_SENSITIVITY, MIN_SENSITIVITY};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Control service URL
    pub endpoint: String,
    /// Forward one move every `sensitivity` hand frames (1-10)
    pub sensitivity: u8,
    /// Flip the horizontal axis
    pub mirrored: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            sensitivity: DEFAULT_SENSITIVITY,
            mirrored: false,
        }
    }
}

/// Values given on the command line; `None` keeps the file or default value.
#[derive(Debug, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub sensitivity: Option<u8>,
    pub mirrored: Option<bool>,
}

impl RelayConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("invalid relay config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Defaults, then the optional file, then `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(endpoint) = overrides.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(sensitivity) = overrides.sensitivity {
            config.sensitivity = sensitivity;
        }
        if let Some(mirrored) = overrides.mirrored {
            config.mirrored = mirrored;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.sensitivity) {
            bail!(
                "sensitivity must be between {MIN_SENSITIVITY} and {MAX_SENSITIVITY}, got {}",
                self.sensitivity
            );
        }
        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            bail!("endpoint must be a ws:// or wss:// URL, got `{}`", self.endpoint);
        }
        Ok(())
    }
}

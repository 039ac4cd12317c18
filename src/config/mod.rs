//! Engine configuration loading
//!
//! Deployments tune the fine policy through a small YAML (or JSON) file.
//! Every field is defaulted, so an empty file yields the storefront's
//! production policy.

use crate::core::fine::FinePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Late-fee policy table.
    pub fine: FinePolicy,
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("failed to parse YAML config")?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse JSON config")?;
        Ok(config)
    }
}

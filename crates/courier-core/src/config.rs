use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration structure deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub engine: Option<EngineSettings>,
    pub plugins: Vec<PluginEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineSettings {
    pub name: Option<String>,
}

/// One `[[plugins]]` entry naming a compiled-in plugin to attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginEntry {
    pub name: String,
    pub enabled: bool,
    pub config: Value,
}

impl Default for PluginEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            config: Value::Null,
        }
    }
}

impl Config {
    /// Validates structural invariants and provides actionable error messages.
    pub fn validate(&self) -> Result<()> {
        if self.plugins.is_empty() {
            bail!("at least one plugin entry is required");
        }
        let mut names = HashSet::new();
        for entry in &self.plugins {
            if entry.name.trim().is_empty() {
                bail!("plugin entries must name a plugin");
            }
            if !names.insert(entry.name.clone()) {
                bail!("duplicate plugin entry `{}`", entry.name);
            }
        }
        if !self.plugins.iter().any(|entry| entry.enabled) {
            bail!("every configured plugin is disabled; enable at least one");
        }
        Ok(())
    }

    /// Engine display name used in logs.
    pub fn engine_name(&self) -> &str {
        self.engine
            .as_ref()
            .and_then(|engine| engine.name.as_deref())
            .unwrap_or("courier")
    }
}

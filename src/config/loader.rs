//! Configuration Loader
//!
//! Layers client settings from built-in defaults, JSON files and environment
//! variables. Later layers win; JSON objects are merged key by key.

use crate::config::settings::ClientConfig;
use crate::error::{OaiError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an extra config file
pub const CONFIG_PATH_ENV: &str = "OAI_CONFIG_PATH";
pub const ORGANIZATION_ENV: &str = "OPENAI_ORGANIZATION";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    value: Value,
}

impl ConfigLoader {
    /// Defaults, then every config file found in the default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self::defaults()?;
        for path in Self::config_paths() {
            if path.exists() {
                loader.load_from_file(&path)?;
            }
        }
        Ok(loader)
    }

    /// Defaults, then one specific file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::defaults()?;
        loader.load_from_file(path)?;
        Ok(loader)
    }

    fn defaults() -> Result<Self> {
        Ok(Self {
            value: serde_json::to_value(ClientConfig::default())?,
        })
    }

    /// Paths checked by [`ConfigLoader::new`], lowest precedence first
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".oai").join("config.json"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("oai").join("config.json"));
        }
        paths.push(PathBuf::from("oai.json"));
        if let Ok(custom_path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Merge one JSON file over what is loaded so far.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OaiError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let layer: Value = serde_json::from_str(&content)
            .map_err(|e| OaiError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        if !layer.is_object() {
            return Err(OaiError::Config(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        }

        debug!(path = %path.display(), "loaded config file");
        self.merge(layer);
        Ok(())
    }

    /// Merge a JSON layer over what is loaded so far.
    pub fn merge(&mut self, layer: Value) {
        merge_values(&mut self.value, layer);
    }

    /// Typed settings with process environment overrides applied.
    pub fn into_config(self) -> Result<ClientConfig> {
        self.into_config_with(|name| std::env::var(name).ok())
    }

    /// Typed settings with overrides from `env`.
    pub fn into_config_with<F>(self, env: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: ClientConfig = serde_json::from_value(self.value)
            .map_err(|e| OaiError::Config(format!("Invalid configuration: {}", e)))?;

        let lookup = |name: &str| env(name).filter(|v| !v.is_empty());
        if let Some(key) = lookup(&config.api_key_env) {
            config.api_key = Some(key);
        }
        if let Some(org) = lookup(ORGANIZATION_ENV) {
            config.organization = Some(org);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            config.base_url = url;
        }

        Ok(config)
    }
}

fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

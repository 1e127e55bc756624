use crate::normalize::NormalizedManifest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_IMAGE: &str = "docker.io/library/python:3.8";
pub const DEFAULT_PYTHON_INDEX_URL: &str = "https://mirror.sjtu.edu.cn/pypi/web/simple";
pub const DEFAULT_CONTEXT_NAME: &str = "context";
pub const DEFAULT_AUTHORIZED_KEYS_SOURCE: &str = "examples/ssh_keypairs/public.pub";
pub const DEFAULT_SSH_BINARY_SOURCE: &str = "bin/envplan-ssh";
pub const DEFAULT_PLATFORM: &str = "linux/amd64";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid compiler config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("HOME not set")]
    NoHome,
}

/// Knobs the compiler reads besides the environment descriptor.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub base_image: String,
    pub python_index_url: String,
    /// Name of the local build context the file-injection stage copies from.
    pub context_name: String,
    pub authorized_keys_source: String,
    pub ssh_binary_source: String,
    pub platform: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_BASE_IMAGE.to_owned(),
            python_index_url: DEFAULT_PYTHON_INDEX_URL.to_owned(),
            context_name: DEFAULT_CONTEXT_NAME.to_owned(),
            authorized_keys_source: DEFAULT_AUTHORIZED_KEYS_SOURCE.to_owned(),
            ssh_binary_source: DEFAULT_SSH_BINARY_SOURCE.to_owned(),
            platform: DEFAULT_PLATFORM.to_owned(),
        }
    }
}

impl CompilerConfig {
    /// Load config from `~/.config/envplan/config.json`, falling back to
    /// defaults when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply the overrides a manifest carries on top of this config.
    #[must_use]
    pub fn with_manifest_overrides(mut self, manifest: &NormalizedManifest) -> Self {
        if let Some(image) = &manifest.base_image {
            self.base_image.clone_from(image);
        }
        if let Some(url) = &manifest.python_index_url {
            self.python_index_url.clone_from(url);
        }
        self
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/envplan/config.json"))
}

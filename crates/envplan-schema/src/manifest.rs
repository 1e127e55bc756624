use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported manifest_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("base.{0} must not be empty")]
    EmptyBaseField(&'static str),
    #[error("python.index_url is not an http(s) URL: '{0}'")]
    InvalidIndexUrl(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestV1 {
    pub manifest_version: u32,
    #[serde(default)]
    pub base: BaseSection,
    #[serde(default)]
    pub system: SystemSection,
    #[serde(default)]
    pub python: PythonSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BaseSection {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Overrides the configured base image reference.
    #[serde(default)]
    pub image: Option<String>,
}

impl Default for BaseSection {
    fn default() -> Self {
        Self {
            os: default_os(),
            language: default_language(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SystemSection {
    #[serde(default)]
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PythonSection {
    #[serde(default)]
    pub packages: Vec<String>,
    /// Overrides the configured package index mirror.
    #[serde(default)]
    pub index_url: Option<String>,
}

fn default_os() -> String {
    crate::OS_DEFAULT.to_owned()
}

fn default_language() -> String {
    crate::LANGUAGE_DEFAULT.to_owned()
}

pub fn parse_manifest_str(input: &str) -> Result<ManifestV1, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ManifestV1, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

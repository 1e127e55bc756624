use crate::environment::Environment;
use crate::manifest::{ManifestError, ManifestV1};
use serde::{Deserialize, Serialize};

/// Validated manifest: the environment descriptor plus the per-manifest
/// overrides of compiler configuration.
///
/// Package names are trimmed and blank entries dropped. Unlike identifiers,
/// package lists are neither sorted nor deduplicated: install order follows
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedManifest {
    pub manifest_version: u32,
    pub environment: Environment,
    pub base_image: Option<String>,
    pub python_index_url: Option<String>,
}

impl ManifestV1 {
    pub fn normalize(&self) -> Result<NormalizedManifest, ManifestError> {
        if self.manifest_version != 1 {
            return Err(ManifestError::UnsupportedVersion(self.manifest_version));
        }

        let os = self.base.os.trim();
        if os.is_empty() {
            return Err(ManifestError::EmptyBaseField("os"));
        }
        let language = self.base.language.trim();
        if language.is_empty() {
            return Err(ManifestError::EmptyBaseField("language"));
        }

        let base_image = match self.base.image.as_deref().map(str::trim) {
            Some("") => return Err(ManifestError::EmptyBaseField("image")),
            other => other.map(str::to_owned),
        };

        let python_index_url = match self.python.index_url.as_deref().map(str::trim) {
            Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
                Some(url.trim_end_matches('/').to_owned())
            }
            Some(url) => return Err(ManifestError::InvalidIndexUrl(url.to_owned())),
            None => None,
        };

        let environment = Environment::new()
            .with_os(os)
            .with_language(language)
            .with_system_packages(normalize_package_list(&self.system.packages))
            .with_language_packages(normalize_package_list(&self.python.packages));

        Ok(NormalizedManifest {
            manifest_version: self.manifest_version,
            environment,
            base_image,
            python_index_url,
        })
    }
}

fn normalize_package_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}

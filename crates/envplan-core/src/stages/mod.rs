//! Stage builders.
//!
//! Each builder is a pure function from a base [`State`] (plus the
//! descriptor and config) to a derived branch. Builders never look at each
//! other's output, so they can run in any order or at the same time.

pub mod files;
pub mod language;
pub mod system;

use crate::CoreError;
use envplan_llb::{LlbError, State};
use envplan_schema::{CompilerConfig, Environment};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    SystemPackages,
    LanguagePackages,
    FileInjection,
}

/// Every stage, in merge order.
pub const STAGES: [StageKind; 3] = [
    StageKind::SystemPackages,
    StageKind::LanguagePackages,
    StageKind::FileInjection,
];

impl StageKind {
    pub fn build(
        self,
        base: &State,
        env: &Environment,
        config: &CompilerConfig,
    ) -> Result<State, CoreError> {
        match self {
            StageKind::SystemPackages => system::build(base, env),
            StageKind::LanguagePackages => language::build(base, env, &config.python_index_url),
            StageKind::FileInjection => files::build(base, &files::FileInjection::from(config)),
        }
    }

    pub(crate) fn wrap(self) -> impl FnOnce(LlbError) -> CoreError {
        move |source| CoreError::Stage {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::SystemPackages => f.write_str("system-packages"),
            StageKind::LanguagePackages => f.write_str("language-packages"),
            StageKind::FileInjection => f.write_str("file-injection"),
        }
    }
}

/// Reject names a package manager would misread. Duplicates are allowed.
pub(crate) fn validate_packages(stage: StageKind, packages: &[String]) -> Result<(), CoreError> {
    for package in packages {
        let reason = if package.is_empty() {
            Some("must not be empty")
        } else if package.starts_with('-') {
            Some("must not start with '-'")
        } else if package.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("must not contain whitespace or control characters")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(CoreError::InvalidPackage {
                stage,
                package: package.clone(),
                reason,
            });
        }
    }
    Ok(())
}

use serde::{Deserialize, Serialize};

/// Operating system family targeted when none is given.
pub const OS_DEFAULT: &str = "ubuntu20.04";

/// Language runtime targeted when none is given.
pub const LANGUAGE_DEFAULT: &str = "python3";

/// Immutable description of a development environment.
///
/// Package lists keep the order they were declared in and may contain
/// duplicates. There is no shared default instance: [`Environment::default`]
/// builds a fresh value, and every `with_*` method consumes the descriptor
/// and returns a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    os: String,
    language: String,
    system_packages: Vec<String>,
    language_packages: Vec<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            os: OS_DEFAULT.to_owned(),
            language: LANGUAGE_DEFAULT.to_owned(),
            system_packages: Vec::new(),
            language_packages: Vec::new(),
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_os(self, os: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_language(self, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_system_packages<I, S>(self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            system_packages: packages.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    #[must_use]
    pub fn with_language_packages<I, S>(self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            language_packages: packages.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn system_packages(&self) -> &[String] {
        &self.system_packages
    }

    pub fn language_packages(&self) -> &[String] {
        &self.language_packages
    }

    /// True when neither package list has entries.
    pub fn is_bare(&self) -> bool {
        self.system_packages.is_empty() && self.language_packages.is_empty()
    }
}

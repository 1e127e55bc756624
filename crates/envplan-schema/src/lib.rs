//! Environment descriptors, manifest parsing, and compiler configuration for envplan.
//!
//! This crate defines the input side of the compiler: the immutable
//! [`Environment`] descriptor, TOML manifest parsing (`ManifestV1`) and its
//! normalization into a descriptor, the JSON-backed [`CompilerConfig`] that
//! carries base image / mirror / context defaults, and built-in presets.

pub mod config;
pub mod environment;
pub mod manifest;
pub mod normalize;
pub mod preset;

pub use config::{CompilerConfig, ConfigError};
pub use environment::{Environment, LANGUAGE_DEFAULT, OS_DEFAULT};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, BaseSection, ManifestError, ManifestV1,
    PythonSection, SystemSection,
};
pub use normalize::NormalizedManifest;
pub use preset::{get_preset, list_presets, Preset, BUILTIN_PRESETS};

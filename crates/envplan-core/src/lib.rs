//! Graph compiler for envplan.
//!
//! This crate turns an [`envplan_schema::Environment`] into a build
//! [`envplan_llb::Definition`]: the three stage builders (system packages,
//! language packages, file injection) each derive a branch from the same base
//! image, the `Compiler` merges the branches, and the plan serializer
//! marshals the result for one platform. Compilation honours a
//! [`CancelToken`] and never returns a partial definition.

pub mod cancel;
pub mod compiler;
pub mod plan;
pub mod stages;

pub use cancel::{install_signal_handler, CancelToken};
pub use compiler::{compile, CompileOptions, Compiler};
pub use plan::{parse_platform, serialize, PlanSummary};
pub use stages::{StageKind, STAGES};

use envplan_llb::{LlbError, MarshalError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] envplan_schema::ManifestError),
    #[error("config error: {0}")]
    Config(#[from] envplan_schema::ConfigError),
    #[error("invalid base image: {0}")]
    BaseImage(#[source] LlbError),
    #[error("{stage} stage: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: LlbError,
    },
    #[error("{stage} stage: invalid package '{package}': {reason}")]
    InvalidPackage {
        stage: StageKind,
        package: String,
        reason: &'static str,
    },
    #[error("merge failed: {0}")]
    Merge(#[source] LlbError),
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("serialization failed: {0}")]
    Marshal(#[from] MarshalError),
    #[error("compilation cancelled")]
    Cancelled,
    #[error("compilation deadline exceeded")]
    DeadlineExceeded,
    #[error("failed to install Ctrl-C handler: {0}")]
    SignalHandler(String),
}

impl CoreError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CoreError::Cancelled | CoreError::DeadlineExceeded)
    }
}

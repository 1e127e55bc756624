//! Low-level build graph for envplan.
//!
//! A [`State`] is an immutable handle on a vertex of a content-addressed
//! operation graph: image and local-context sources, exec steps with
//! attached [`CacheMount`]s, file actions, and merges of independent
//! branches. Extending a state never touches the original, so any number of
//! branches can be derived from one base. [`State::marshal`] flattens the
//! graph into a [`Definition`] for a target [`Platform`].

pub mod command;
pub mod marshal;
pub mod merge;
pub mod mount;
pub mod op;
pub mod platform;
pub mod state;
pub mod types;

pub use command::Command;
pub use marshal::{Definition, MarshalError, OpMetadata, SerializedOp};
pub use merge::merge;
pub use mount::{CacheMount, CacheSharing};
pub use op::{ExecOp, FileAction, Op, SourceOp};
pub use platform::Platform;
pub use state::State;
pub use types::{Digest, ShortDigest};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlbError {
    #[error("command has an empty program")]
    EmptyProgram,
    #[error("command argument contains a NUL byte: {0:?}")]
    NulByte(String),
    #[error("path must be absolute: '{0}'")]
    RelativePath(String),
    #[error("invalid file mode {0:#o}")]
    InvalidMode(u32),
    #[error("invalid source reference: '{0}'")]
    InvalidSource(String),
    #[error("merge needs at least one input")]
    EmptyMerge,
    #[error("merge conflict on '{path}': {detail}")]
    MergeConflict { path: String, detail: String },
    #[error("failed to encode operation: {0}")]
    Encode(#[from] serde_json::Error),
}

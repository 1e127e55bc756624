use crate::command::Command;
use crate::mount::CacheMount;
use serde::{Deserialize, Serialize};

const IMAGE_SCHEME: &str = "docker-image://";
const LOCAL_SCHEME: &str = "local://";

/// One operation in the build graph. Inputs live on the vertex, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Op {
    Source(SourceOp),
    /// Input 0 is the root filesystem.
    Exec(ExecOp),
    /// Input 0 is the filesystem acted on; a copy reads from input 1.
    File(FileAction),
    /// Overlays every input, later inputs on top of earlier ones.
    Merge,
}

impl Op {
    pub fn description(&self) -> String {
        match self {
            Op::Source(src) => src.identifier.clone(),
            Op::Exec(exec) => exec.command.to_string(),
            Op::File(FileAction::Mkdir { path, mode, .. }) => format!("mkdir {path} ({mode:o})"),
            Op::File(FileAction::Copy { src, dest, .. }) => format!("copy {src} -> {dest}"),
            Op::Merge => "merge".to_owned(),
        }
    }

    pub fn is_exec(&self) -> bool {
        matches!(self, Op::Exec(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOp {
    pub identifier: String,
}

impl SourceOp {
    pub fn image(reference: &str) -> Self {
        Self {
            identifier: format!("{IMAGE_SCHEME}{reference}"),
        }
    }

    pub fn local(name: &str) -> Self {
        Self {
            identifier: format!("{LOCAL_SCHEME}{name}"),
        }
    }

    pub fn image_reference(&self) -> Option<&str> {
        self.identifier.strip_prefix(IMAGE_SCHEME)
    }

    pub fn local_name(&self) -> Option<&str> {
        self.identifier.strip_prefix(LOCAL_SCHEME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOp {
    pub command: Command,
    pub cwd: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_mounts: Vec<CacheMount>,
}

impl ExecOp {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            cwd: "/".to_owned(),
            cache_mounts: Vec::new(),
        }
    }

    #[must_use]
    pub fn cache_mount(mut self, mount: CacheMount) -> Self {
        self.cache_mounts.push(mount);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileAction {
    Mkdir {
        path: String,
        mode: u32,
        make_parents: bool,
    },
    Copy {
        src: String,
        dest: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<u32>,
    },
}

impl FileAction {
    /// Path inside the target filesystem this action writes.
    pub fn destination(&self) -> &str {
        match self {
            FileAction::Mkdir { path, .. } => path,
            FileAction::Copy { dest, .. } => dest,
        }
    }
}

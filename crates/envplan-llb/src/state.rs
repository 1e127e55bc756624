use crate::op::{ExecOp, FileAction, Op, SourceOp};
use crate::types::Digest;
use crate::LlbError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

const MAX_MODE: u32 = 0o7777;

#[derive(Debug)]
struct Vertex {
    op: Op,
    inputs: Vec<State>,
    digest: Digest,
}

/// Immutable handle on a filesystem state: a vertex plus everything it was
/// derived from.
///
/// Cloning is cheap (one `Arc`). Every builder method returns a new state
/// whose inputs point at `self`; `self` is never modified. Two states are
/// equal when their digests are, i.e. when they describe the same operations
/// over the same inputs.
#[derive(Debug, Clone)]
pub struct State {
    vertex: Arc<Vertex>,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    op: &'a Op,
    inputs: Vec<&'a Digest>,
}

impl State {
    pub(crate) fn from_op(op: Op, inputs: Vec<State>) -> Result<Self, LlbError> {
        let digest = vertex_digest(&op, inputs.iter().map(State::digest).collect())?;
        trace!("vertex {} <- {}", digest.short(), op.description());
        Ok(Self {
            vertex: Arc::new(Vertex { op, inputs, digest }),
        })
    }

    /// Root filesystem of a container image.
    pub fn image(reference: &str) -> Result<Self, LlbError> {
        let reference = reference.trim();
        if reference.is_empty()
            || reference.contains("://")
            || reference.contains(char::is_whitespace)
        {
            return Err(LlbError::InvalidSource(reference.to_owned()));
        }
        Self::from_op(Op::Source(SourceOp::image(reference)), Vec::new())
    }

    /// Files supplied by the caller under a named local context.
    pub fn local(name: &str) -> Result<Self, LlbError> {
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(LlbError::InvalidSource(name.to_owned()));
        }
        Self::from_op(Op::Source(SourceOp::local(name)), Vec::new())
    }

    /// Run a command with this state as its root filesystem.
    pub fn run(&self, exec: ExecOp) -> Result<Self, LlbError> {
        exec.command.validate()?;
        require_absolute(&exec.cwd)?;
        for mount in &exec.cache_mounts {
            require_absolute(&mount.target)?;
        }
        Self::from_op(Op::Exec(exec), vec![self.clone()])
    }

    pub fn mkdir(&self, path: &str, mode: u32, make_parents: bool) -> Result<Self, LlbError> {
        require_absolute(path)?;
        require_mode(mode)?;
        Self::from_op(
            Op::File(FileAction::Mkdir {
                path: path.to_owned(),
                mode,
                make_parents,
            }),
            vec![self.clone()],
        )
    }

    /// Copy `src` (relative to `source`) to the absolute `dest` in this state.
    pub fn copy(
        &self,
        source: &State,
        src: &str,
        dest: &str,
        mode: Option<u32>,
    ) -> Result<Self, LlbError> {
        if src.trim().is_empty() || src.contains('\0') {
            return Err(LlbError::InvalidSource(src.to_owned()));
        }
        require_absolute(dest)?;
        if let Some(mode) = mode {
            require_mode(mode)?;
        }
        Self::from_op(
            Op::File(FileAction::Copy {
                src: src.to_owned(),
                dest: dest.to_owned(),
                mode,
            }),
            vec![self.clone(), source.clone()],
        )
    }

    pub fn digest(&self) -> &Digest {
        &self.vertex.digest
    }

    pub fn op(&self) -> &Op {
        &self.vertex.op
    }

    pub fn inputs(&self) -> &[State] {
        &self.vertex.inputs
    }

    /// Every distinct state reachable from this one, inputs before the
    /// states that consume them, this state last.
    pub fn ancestry(&self) -> Vec<State> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        walk(self, &mut seen, &mut out);
        out
    }
}

/// Content digest of an operation over the given input digests.
pub(crate) fn vertex_digest(op: &Op, inputs: Vec<&Digest>) -> Result<Digest, serde_json::Error> {
    let encoded = serde_json::to_vec(&DigestInput { op, inputs })?;
    Ok(Digest::of(&encoded))
}

fn walk(state: &State, seen: &mut HashSet<Digest>, out: &mut Vec<State>) {
    if seen.contains(state.digest()) {
        return;
    }
    for input in state.inputs() {
        walk(input, seen, out);
    }
    seen.insert(state.digest().clone());
    out.push(state.clone());
}

fn require_absolute(path: &str) -> Result<(), LlbError> {
    if path.starts_with('/') && !path.contains('\0') {
        Ok(())
    } else {
        Err(LlbError::RelativePath(path.to_owned()))
    }
}

fn require_mode(mode: u32) -> Result<(), LlbError> {
    if mode > MAX_MODE {
        return Err(LlbError::InvalidMode(mode));
    }
    Ok(())
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.digest() == other.digest()
    }
}

impl Eq for State {}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.digest().short(), self.op().description())
    }
}

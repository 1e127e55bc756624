use crate::op::{ExecOp, Op};
use crate::platform::Platform;
use crate::state::{vertex_digest, State};
use crate::types::{Digest, ShortDigest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::debug;

pub const DEFINITION_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(Platform),
    #[error("unsupported definition version: {0}")]
    UnsupportedVersion(u32),
    #[error("definition encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("inconsistent definition: {0}")]
    Inconsistent(String),
}

/// One vertex of a [`Definition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedOp {
    pub digest: Digest,
    pub inputs: Vec<Digest>,
    pub op: Op,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpMetadata {
    pub description: String,
}

/// Engine-consumable form of a composed state.
///
/// Ops are listed so that every op comes after all of its inputs; each
/// distinct vertex appears once, and the terminal op is last. Once built a
/// definition is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    version: u32,
    platform: Platform,
    ops: Vec<SerializedOp>,
    metadata: BTreeMap<Digest, OpMetadata>,
    terminal: Digest,
}

impl State {
    /// Flatten the graph ending at this state into a [`Definition`].
    pub fn marshal(&self, platform: &Platform) -> Result<Definition, MarshalError> {
        if !platform.is_supported() {
            return Err(MarshalError::UnsupportedPlatform(platform.clone()));
        }

        let ancestry = self.ancestry();
        let mut ops = Vec::with_capacity(ancestry.len());
        let mut metadata = BTreeMap::new();
        for state in &ancestry {
            ops.push(SerializedOp {
                digest: state.digest().clone(),
                inputs: state.inputs().iter().map(|i| i.digest().clone()).collect(),
                op: state.op().clone(),
            });
            metadata.insert(
                state.digest().clone(),
                OpMetadata {
                    description: state.op().description(),
                },
            );
        }

        debug!(
            "marshalled {} ops for {platform}, terminal {}",
            ops.len(),
            self.digest().short()
        );
        Ok(Definition {
            version: DEFINITION_VERSION,
            platform: platform.clone(),
            ops,
            metadata,
            terminal: self.digest().clone(),
        })
    }
}

impl Definition {
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn terminal(&self) -> &Digest {
        &self.terminal
    }

    pub fn short_digest(&self) -> ShortDigest {
        self.terminal.short()
    }

    pub fn ops(&self) -> &[SerializedOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn metadata(&self, digest: &Digest) -> Option<&OpMetadata> {
        self.metadata.get(digest)
    }

    pub fn terminal_op(&self) -> Option<&SerializedOp> {
        self.ops.last()
    }

    pub fn exec_ops(&self) -> impl Iterator<Item = (&SerializedOp, &ExecOp)> + '_ {
        self.ops.iter().filter_map(|s| match &s.op {
            Op::Exec(exec) => Some((s, exec)),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String, MarshalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, MarshalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a definition and check it with [`Definition::verify`].
    pub fn from_json(input: &str) -> Result<Self, MarshalError> {
        let def: Definition = serde_json::from_str(input)?;
        def.verify()?;
        Ok(def)
    }

    /// Check that digests match their ops, inputs precede their consumers,
    /// and the terminal op is last.
    pub fn verify(&self) -> Result<(), MarshalError> {
        if self.version != DEFINITION_VERSION {
            return Err(MarshalError::UnsupportedVersion(self.version));
        }
        if !self.platform.is_supported() {
            return Err(MarshalError::UnsupportedPlatform(self.platform.clone()));
        }

        let mut seen: HashSet<&Digest> = HashSet::new();
        for entry in &self.ops {
            let computed = vertex_digest(&entry.op, entry.inputs.iter().collect())?;
            if computed != entry.digest {
                return Err(MarshalError::Inconsistent(format!(
                    "op {} hashes to {}",
                    entry.digest, computed
                )));
            }
            if let Some(missing) = entry.inputs.iter().find(|d| !seen.contains(d)) {
                return Err(MarshalError::Inconsistent(format!(
                    "op {} uses {} before it is defined",
                    entry.digest, missing
                )));
            }
            if !seen.insert(&entry.digest) {
                return Err(MarshalError::Inconsistent(format!(
                    "op {} listed twice",
                    entry.digest
                )));
            }
        }

        match self.ops.last() {
            Some(last) if last.digest == self.terminal => Ok(()),
            _ => Err(MarshalError::Inconsistent(format!(
                "terminal {} is not the last op",
                self.terminal
            ))),
        }
    }

    /// Human-readable listing, one op per line with its inputs and mounts.
    pub fn render_text(&self) -> String {
        let index: BTreeMap<&Digest, usize> = self
            .ops
            .iter()
            .enumerate()
            .map(|(i, op)| (&op.digest, i))
            .collect();

        let mut out = String::new();
        let _ = writeln!(out, "platform {}", self.platform);
        for (i, entry) in self.ops.iter().enumerate() {
            let description = self
                .metadata(&entry.digest)
                .map_or_else(|| entry.op.description(), |m| m.description.clone());
            let _ = writeln!(out, "{i:>3} {}  {description}", entry.digest.short());
            if !entry.inputs.is_empty() {
                let inputs: Vec<String> = entry
                    .inputs
                    .iter()
                    .map(|d| index.get(d).map_or_else(|| d.to_string(), usize::to_string))
                    .collect();
                let _ = writeln!(out, "      inputs: {}", inputs.join(", "));
            }
            if let Op::Exec(exec) = &entry.op {
                for mount in &exec.cache_mounts {
                    let _ = writeln!(out, "      mount {mount}");
                }
            }
        }
        out
    }
}

use crate::cancel::CancelToken;
use crate::CoreError;
use envplan_llb::{CacheMount, Definition, Op, Platform, State};
use serde::Serialize;
use tracing::debug;

pub fn parse_platform(s: &str) -> Result<Platform, CoreError> {
    s.parse().map_err(CoreError::InvalidPlatform)
}

/// Marshal `state` for `platform`.
///
/// The token is checked on both sides of marshalling; a definition produced
/// after cancellation is dropped rather than returned.
pub fn serialize(
    state: &State,
    platform: &Platform,
    token: &CancelToken,
) -> Result<Definition, CoreError> {
    token.check()?;
    let definition = state.marshal(platform)?;
    token.check()?;
    debug!(
        "definition {} ready ({} ops)",
        definition.short_digest(),
        definition.len()
    );
    Ok(definition)
}

/// Compact description of a definition, for reports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanSummary {
    pub digest: String,
    pub short_digest: String,
    pub platform: String,
    pub base_images: Vec<String>,
    pub op_count: usize,
    pub exec_steps: Vec<Vec<String>>,
    pub cache_mounts: Vec<CacheMount>,
    pub file_actions: usize,
}

impl PlanSummary {
    pub fn of(definition: &Definition) -> Self {
        let base_images = definition
            .ops()
            .iter()
            .filter_map(|o| match &o.op {
                Op::Source(src) => src.image_reference().map(str::to_owned),
                _ => None,
            })
            .collect();
        let file_actions = definition
            .ops()
            .iter()
            .filter(|o| matches!(o.op, Op::File(_)))
            .count();

        Self {
            digest: definition.terminal().to_string(),
            short_digest: definition.short_digest().into_inner(),
            platform: definition.platform().to_string(),
            base_images,
            op_count: definition.len(),
            exec_steps: definition
                .exec_ops()
                .map(|(_, exec)| exec.command.argv())
                .collect(),
            cache_mounts: definition
                .exec_ops()
                .flat_map(|(_, exec)| exec.cache_mounts.iter().cloned())
                .collect(),
            file_actions,
        }
    }
}

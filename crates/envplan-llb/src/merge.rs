use crate::op::{FileAction, Op};
use crate::state::State;
use crate::types::Digest;
use crate::LlbError;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Compose independently derived states into one.
///
/// Every input is kept, in order, so no branch's effects are dropped and each
/// branch keeps its internal step order. A single input is returned as is.
///
/// Branches are expected to touch disjoint paths. Operations a branch shares
/// with another (typically the common base) are ignored; among the rest, two
/// branches writing the same path is a conflict, except for directories
/// created with identical modes.
pub fn merge(states: &[State]) -> Result<State, LlbError> {
    match states {
        [] => Err(LlbError::EmptyMerge),
        [only] => Ok(only.clone()),
        _ => {
            check_disjoint(states)?;
            debug!("merging {} branches", states.len());
            State::from_op(Op::Merge, states.to_vec())
        }
    }
}

fn check_disjoint(states: &[State]) -> Result<(), LlbError> {
    let ancestries: Vec<Vec<State>> = states.iter().map(State::ancestry).collect();

    let mut owners: HashMap<&Digest, HashSet<usize>> = HashMap::new();
    for (branch, ancestry) in ancestries.iter().enumerate() {
        for state in ancestry {
            owners.entry(state.digest()).or_default().insert(branch);
        }
    }

    let mut writes: BTreeMap<String, (usize, &FileAction)> = BTreeMap::new();
    for (branch, ancestry) in ancestries.iter().enumerate() {
        for state in ancestry {
            let Op::File(action) = state.op() else {
                continue;
            };
            if owners.get(state.digest()).map_or(0, HashSet::len) > 1 {
                continue;
            }
            let path = normalize_path(action.destination());
            match writes.get(&path) {
                Some((other, _)) if *other == branch => {}
                Some((other, previous)) => {
                    if !same_directory(previous, action) {
                        return Err(LlbError::MergeConflict {
                            path,
                            detail: format!("written by branches {other} and {branch}"),
                        });
                    }
                }
                None => {
                    writes.insert(path, (branch, action));
                }
            }
        }
    }
    Ok(())
}

fn same_directory(a: &FileAction, b: &FileAction) -> bool {
    matches!(
        (a, b),
        (FileAction::Mkdir { mode: m1, .. }, FileAction::Mkdir { mode: m2, .. }) if m1 == m2
    )
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        trimmed.to_owned()
    }
}

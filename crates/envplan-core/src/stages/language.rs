use super::{validate_packages, StageKind};
use crate::CoreError;
use envplan_llb::{CacheMount, Command, ExecOp, State};
use envplan_schema::Environment;
use tracing::debug;

pub const PIP_CACHE_DIR: &str = "/root/.cache/pip";

pub fn install_command(index_url: &str, packages: &[String]) -> Command {
    Command::new("pip")
        .args(["install", "-i", index_url])
        .args(packages.iter().cloned())
}

/// Install the descriptor's language packages from `index_url`.
///
/// With no language packages the base is returned as is.
pub fn build(base: &State, env: &Environment, index_url: &str) -> Result<State, CoreError> {
    let packages = env.language_packages();
    if packages.is_empty() {
        return Ok(base.clone());
    }
    validate_packages(StageKind::LanguagePackages, packages)?;
    debug!(
        "installing {} language packages from {index_url}",
        packages.len()
    );

    let exec = ExecOp::new(install_command(index_url, packages))
        .cache_mount(CacheMount::shared(PIP_CACHE_DIR));
    base.run(exec).map_err(StageKind::LanguagePackages.wrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use envplan_llb::{CacheSharing, Op};
    use envplan_schema::config::DEFAULT_PYTHON_INDEX_URL;

    fn base() -> State {
        State::image("docker.io/library/python:3.8").unwrap()
    }

    #[test]
    fn empty_list_is_identity() {
        let root = base();
        let env = Environment::default().with_system_packages(["curl"]);
        assert_eq!(build(&root, &env, DEFAULT_PYTHON_INDEX_URL).unwrap(), root);
    }

    #[test]
    fn uses_mirror_and_keeps_order() {
        let env = Environment::default().with_language_packages(["pandas", "numpy"]);
        let out = build(&base(), &env, DEFAULT_PYTHON_INDEX_URL).unwrap();
        let Op::Exec(exec) = out.op() else {
            panic!("expected exec op");
        };
        assert_eq!(
            exec.command.argv(),
            [
                "pip",
                "install",
                "-i",
                DEFAULT_PYTHON_INDEX_URL,
                "pandas",
                "numpy"
            ]
        );
    }

    #[test]
    fn one_shared_cache_mount() {
        let env = Environment::default().with_language_packages(["numpy"]);
        let out = build(&base(), &env, "https://pypi.org/simple").unwrap();
        let Op::Exec(exec) = out.op() else {
            panic!("expected exec op");
        };
        assert_eq!(exec.cache_mounts.len(), 1);
        assert_eq!(exec.cache_mounts[0].target, PIP_CACHE_DIR);
        assert_eq!(exec.cache_mounts[0].sharing, CacheSharing::Shared);
    }

    #[test]
    fn mirror_changes_digest() {
        let env = Environment::default().with_language_packages(["numpy"]);
        let a = build(&base(), &env, "https://pypi.org/simple").unwrap();
        let b = build(&base(), &env, DEFAULT_PYTHON_INDEX_URL).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mirror_with_nul_is_a_stage_error() {
        let env = Environment::default().with_language_packages(["numpy"]);
        let err = build(&base(), &env, "https://bad\0mirror").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Stage {
                stage: StageKind::LanguagePackages,
                ..
            }
        ));
    }
}

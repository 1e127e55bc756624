use super::{validate_packages, StageKind};
use crate::CoreError;
use envplan_llb::{CacheMount, Command, ExecOp, State};
use envplan_schema::Environment;
use tracing::debug;

pub const APT_CACHE_DIR: &str = "/var/cache/apt";
pub const APT_LIB_DIR: &str = "/var/lib/apt";

pub fn install_command(packages: &[String]) -> Command {
    Command::new("apt-get")
        .args(["install", "-y", "--no-install-recommends"])
        .args(packages.iter().cloned())
}

/// Install the descriptor's system packages on top of `base`.
///
/// With no system packages the base is returned as is.
pub fn build(base: &State, env: &Environment) -> Result<State, CoreError> {
    let packages = env.system_packages();
    if packages.is_empty() {
        return Ok(base.clone());
    }
    validate_packages(StageKind::SystemPackages, packages)?;
    debug!("installing {} system packages", packages.len());

    let exec = ExecOp::new(install_command(packages))
        .cache_mount(CacheMount::shared(APT_CACHE_DIR))
        .cache_mount(CacheMount::shared(APT_LIB_DIR));
    base.run(exec).map_err(StageKind::SystemPackages.wrap())
}

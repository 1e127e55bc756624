use super::StageKind;
use crate::CoreError;
use envplan_llb::State;
use envplan_schema::CompilerConfig;

pub const REMOTE_DIR: &str = "/var/envplan/remote/";
pub const BIN_DIR: &str = "/var/envplan/bin/";
pub const AUTHORIZED_KEYS_DEST: &str = "/var/envplan/remote/authorized_keys";
pub const SSH_BINARY_DEST: &str = "/var/envplan/bin/envplan-ssh";

pub const DIR_MODE: u32 = 0o700;
pub const AUTHORIZED_KEYS_MODE: u32 = 0o600;
pub const SSH_BINARY_MODE: u32 = 0o755;

/// Where the file-injection stage reads its inputs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInjection {
    pub context_name: String,
    pub authorized_keys_source: String,
    pub ssh_binary_source: String,
}

impl From<&CompilerConfig> for FileInjection {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            context_name: config.context_name.clone(),
            authorized_keys_source: config.authorized_keys_source.clone(),
            ssh_binary_source: config.ssh_binary_source.clone(),
        }
    }
}

/// Create the envplan directories and copy the authorized keys and the SSH
/// helper out of the local context. Runs for every environment.
pub fn build(base: &State, injection: &FileInjection) -> Result<State, CoreError> {
    let stage = StageKind::FileInjection;
    let context = State::local(&injection.context_name).map_err(stage.wrap())?;

    base.mkdir(REMOTE_DIR, DIR_MODE, true)
        .and_then(|s| s.mkdir(BIN_DIR, DIR_MODE, true))
        .and_then(|s| {
            s.copy(
                &context,
                &injection.authorized_keys_source,
                AUTHORIZED_KEYS_DEST,
                Some(AUTHORIZED_KEYS_MODE),
            )
        })
        .and_then(|s| {
            s.copy(
                &context,
                &injection.ssh_binary_source,
                SSH_BINARY_DEST,
                Some(SSH_BINARY_MODE),
            )
        })
        .map_err(stage.wrap())
}

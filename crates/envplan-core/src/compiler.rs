use crate::cancel::CancelToken;
use crate::plan::{parse_platform, serialize};
use crate::stages::{StageKind, STAGES};
use crate::CoreError;
use envplan_llb::{merge, Definition, State};
use envplan_schema::{parse_manifest_file, CompilerConfig, Environment, NormalizedManifest};
use std::path::Path;
use std::thread;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Evaluate the stage builders on scoped threads.
    pub parallel: bool,
}

/// Compiles environment descriptors into build definitions.
///
/// The compiler holds only configuration; every call works on its own
/// descriptor and token, so one compiler can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            options: CompileOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Base image every stage derives from.
    pub fn base(&self, env: &Environment) -> Result<State, CoreError> {
        debug!(
            "selecting base {} for {}/{}",
            self.config.base_image,
            env.os(),
            env.language()
        );
        State::image(&self.config.base_image).map_err(CoreError::BaseImage)
    }

    /// Build every stage against the same base and merge the branches.
    pub fn compile_state(&self, env: &Environment, token: &CancelToken) -> Result<State, CoreError> {
        token.check()?;
        let base = self.base(env)?;

        let branches = if self.options.parallel {
            self.build_parallel(&base, env, token)?
        } else {
            STAGES
                .into_iter()
                .map(|stage| self.build_stage(stage, &base, env, token))
                .collect::<Result<Vec<_>, _>>()?
        };

        token.check()?;
        let merged = merge(&branches).map_err(CoreError::Merge)?;
        info!(
            "compiled {} system and {} language packages into {}",
            env.system_packages().len(),
            env.language_packages().len(),
            merged.digest().short()
        );
        Ok(merged)
    }

    /// Compile `env` and serialize it for the configured platform.
    pub fn compile(&self, env: &Environment, token: &CancelToken) -> Result<Definition, CoreError> {
        let platform = parse_platform(&self.config.platform)?;
        let state = self.compile_state(env, token)?;
        serialize(&state, &platform, token)
    }

    /// Load a manifest, apply its overrides to this compiler's config, and
    /// compile it.
    pub fn compile_manifest(
        &self,
        path: &Path,
        token: &CancelToken,
    ) -> Result<(NormalizedManifest, Definition), CoreError> {
        info!("compiling environment from {}", path.display());
        let normalized = parse_manifest_file(path)?.normalize()?;
        let compiler = Compiler {
            config: self.config.clone().with_manifest_overrides(&normalized),
            options: self.options,
        };
        let definition = compiler.compile(&normalized.environment, token)?;
        Ok((normalized, definition))
    }

    fn build_stage(
        &self,
        stage: StageKind,
        base: &State,
        env: &Environment,
        token: &CancelToken,
    ) -> Result<State, CoreError> {
        token.check()?;
        let branch = stage.build(base, env, &self.config)?;
        debug!("{stage} stage -> {branch}");
        Ok(branch)
    }

    fn build_parallel(
        &self,
        base: &State,
        env: &Environment,
        token: &CancelToken,
    ) -> Result<Vec<State>, CoreError> {
        thread::scope(|scope| {
            let handles: Vec<_> = STAGES
                .into_iter()
                .map(|stage| scope.spawn(move || self.build_stage(stage, base, env, token)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                .collect()
        })
    }
}

/// Compile `env` with the default configuration.
pub fn compile(env: &Environment, token: &CancelToken) -> Result<Definition, CoreError> {
    Compiler::default().compile(env, token)
}

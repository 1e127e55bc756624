use super::{heading, json_pretty, spin_fail, spin_ok, spinner, write_atomic, EXIT_SUCCESS};
use clap::ValueEnum;
use envplan_core::{install_signal_handler, CancelToken, CompileOptions, Compiler, PlanSummary};
use envplan_llb::Definition;
use envplan_schema::CompilerConfig;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Serialized definition, for handing to a builder.
    #[default]
    Json,
    /// One line per op, for reading.
    Text,
}

#[derive(Debug, Clone, Default)]
pub struct CompileArgs<'a> {
    pub platform: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub format: OutputFormat,
    pub parallel: bool,
    pub timeout_secs: Option<u64>,
}

fn render(definition: &Definition, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => definition.to_json_pretty().map_err(|e| e.to_string()),
        OutputFormat::Text => Ok(definition.render_text()),
    }
}

fn token_for(timeout_secs: Option<u64>) -> Result<CancelToken, String> {
    let token = match timeout_secs {
        Some(secs) => CancelToken::new().with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    install_signal_handler(&token).map_err(|e| e.to_string())?;
    Ok(token)
}

pub fn run(
    mut config: CompilerConfig,
    manifest: &Path,
    args: &CompileArgs<'_>,
    json: bool,
) -> Result<u8, String> {
    if let Some(platform) = args.platform {
        platform.clone_into(&mut config.platform);
    }
    let compiler = Compiler::new(config).with_options(CompileOptions {
        parallel: args.parallel,
    });
    let token = token_for(args.timeout_secs)?;

    let pb = if json {
        None
    } else {
        Some(spinner("compiling environment..."))
    };
    let (normalized, definition) = match compiler.compile_manifest(manifest, &token) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "environment compiled");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "compilation failed");
            }
            return Err(e.to_string());
        }
    };

    // --json without --output always emits the serialized definition.
    let format = if json && args.output.is_none() {
        OutputFormat::Json
    } else {
        args.format
    };
    let rendered = render(&definition, format)?;

    let Some(output) = args.output else {
        println!("{rendered}");
        return Ok(EXIT_SUCCESS);
    };
    write_atomic(output, &rendered)?;

    let summary = PlanSummary::of(&definition);
    if json {
        let payload = serde_json::json!({
            "status": "compiled",
            "output": output.display().to_string(),
            "summary": summary,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let env = &normalized.environment;
        println!("{} {}", heading("definition"), summary.short_digest);
        println!("digest:    {}", summary.digest);
        println!("platform:  {}", summary.platform);
        println!("base:      {}", summary.base_images.join(", "));
        println!(
            "packages:  {} system, {} language",
            env.system_packages().len(),
            env.language_packages().len()
        );
        println!("ops:       {}", summary.op_count);
        println!("written:   {}", output.display());
    }
    Ok(EXIT_SUCCESS)
}

mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::compile::{CompileArgs, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "envplan",
    version,
    about = "Compile declarative development environments into container build graphs"
)]
struct Cli {
    /// Path to a compiler config file (default: ~/.config/envplan/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile a manifest into a build definition.
    Compile {
        /// Path to manifest TOML file.
        #[arg(default_value = "envplan.toml")]
        manifest: PathBuf,
        /// Target platform as os/arch (overrides config).
        #[arg(long)]
        platform: Option<String>,
        /// Write the definition to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Definition output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Build the stages on separate threads.
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Abort compilation after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Scaffold a new environment directory from a preset.
    New {
        /// Directory to create the manifest in.
        name: String,
        /// Preset to start from (see `envplan presets`).
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing manifest.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// List built-in presets.
    Presets,
    /// Show the normalized environment a manifest describes.
    Show {
        /// Path to manifest TOML file.
        #[arg(default_value = "envplan.toml")]
        manifest: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ENVPLAN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Compile {
            manifest,
            platform,
            output,
            format,
            parallel,
            timeout_secs,
        } => commands::load_config(config_path).and_then(|config| {
            commands::compile::run(
                config,
                &manifest,
                &CompileArgs {
                    platform: platform.as_deref(),
                    output: output.as_deref(),
                    format,
                    parallel,
                    timeout_secs,
                },
                json_output,
            )
        }),
        Commands::New {
            name,
            template,
            force,
        } => commands::new::run(&name, template.as_deref(), force, json_output),
        Commands::Presets => commands::presets::run(json_output),
        Commands::Show { manifest } => commands::load_config(config_path)
            .and_then(|config| commands::show::run(config, &manifest, json_output)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for(&msg))
        }
    }
}

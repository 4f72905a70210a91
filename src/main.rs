//! meshscript CLI
//!
//! Runs the bundled scripts through meshlabserver.

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use meshscript::cli::commands::{self, RunContext};
use meshscript::cli::{Cli, Commands};
use meshscript::config::{ConfigOverrides, EngineConfig};
use meshscript::script::EngineVersion;
use meshscript::MeshScriptError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("meshscript v{}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        executable: cli.engine.clone(),
        engine_version: cli
            .engine_version
            .as_deref()
            .map(str::parse::<EngineVersion>)
            .transpose()
            .context("invalid --engine-version")?,
        print_output: cli.quiet.then_some(false),
        ..ConfigOverrides::default()
    };
    let config = EngineConfig::resolve(cli.config.as_deref(), &overrides)
        .context("failed to resolve engine configuration")?;
    let ctx = RunContext::new(config, cli.log.clone(), cli.quiet);

    let result = match &cli.command {
        Commands::Shield { output } => commands::shield(&ctx, output),
        Commands::Measure { input } => commands::measure(&ctx, input),
        Commands::Convert {
            input,
            output,
            mask,
        } => commands::convert(&ctx, input, output, mask.as_deref()),
        Commands::EmitShield { output } => commands::emit_shield(&ctx, output.as_deref()),
    };

    if let Err(err) = &result {
        report_failure(err);
    }
    result.context("command failed")
}

fn report_failure(err: &MeshScriptError) {
    eprintln!("error [{}]: {}", err.error_code(), err);
    if let Some(suggestion) = err.recovery_suggestion() {
        eprintln!("hint: {}", suggestion);
    }
}

//! Global flag handling and subcommand dispatch.

use super::command::{Cli, ColorChoice, Commands};
use super::output::{self, OutputConfig};
use super::{check, configs, generate, insights};
use crate::error::Result;

/// Apply global flags and run the selected subcommand.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Generate(args) => generate::execute(&args, cli.verbose).await,
        Commands::Configs(args) => configs::execute(&args, cli.verbose).await,
        Commands::Insights(args) => insights::execute(&args, cli.verbose).await,
        Commands::Check(arg) => check::execute_config(&arg.config),
    }
}

//! Command-line interface definitions.
//!
//! Defines the CLI structure for `sectiond` using `clap`: generating
//! sections for a user and location, listing the configs a request would
//! resolve to, summarizing a market, and validating a configuration file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Marketplace section grouping CLI
#[derive(Parser, Debug)]
#[command(name = "sectiond")]
#[command(version, about)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate sections for a user and location
    Generate(GenerateArgs),

    /// Show the section configs a request resolves to
    Configs(ConfigsArgs),

    /// Summarize the market for a location
    Insights(InsightsArgs),

    /// Validate a configuration file
    Check(ConfigPathArg),
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Generate(_) => "generate",
            Self::Configs(_) => "configs",
            Self::Insights(_) => "insights",
            Self::Check(_) => "check",
        }
    }
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Inputs shared by commands that build the engine.
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// Path to configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Screen catalog JSON, overriding `catalog.path`
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// User to generate for (anonymous when omitted)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Location filter, e.g. a city name
    #[arg(short, long)]
    pub location: Option<String>,
}

/// Arguments for the `generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Maximum number of sections to return
    #[arg(short, long)]
    pub max_sections: Option<usize>,

    /// Bypass cached results
    #[arg(long)]
    pub force_refresh: bool,

    /// List the screens of every section
    #[arg(long)]
    pub screens: bool,
}

/// Arguments for the `configs` subcommand.
#[derive(Parser, Debug)]
pub struct ConfigsArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the `insights` subcommand.
#[derive(Parser, Debug)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "sectiond");
    }

    #[test]
    fn test_parse_generate_defaults() {
        let cli = Cli::try_parse_from(["sectiond", "generate"]).unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.request.config, PathBuf::from("config.toml"));
        assert!(args.request.user.is_none());
        assert!(args.max_sections.is_none());
        assert!(!args.force_refresh);
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_generate_request() {
        let cli = Cli::try_parse_from([
            "sectiond",
            "--json",
            "generate",
            "--user",
            "u1",
            "--location",
            "Bogotá",
            "--max-sections",
            "4",
            "--force-refresh",
        ])
        .unwrap();
        assert!(cli.json);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.request.user.as_deref(), Some("u1"));
        assert_eq!(args.request.location.as_deref(), Some("Bogotá"));
        assert_eq!(args.max_sections, Some(4));
        assert!(args.force_refresh);
    }

    #[test]
    fn test_json_flag_is_global() {
        let cli = Cli::try_parse_from(["sectiond", "configs", "--json", "-u", "u2"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Configs(_)));
    }

    #[test]
    fn test_parse_insights() {
        let cli = Cli::try_parse_from(["sectiond", "insights", "-l", "Cali"]).unwrap();
        assert_eq!(cli.command.name(), "insights");
        let Commands::Insights(args) = cli.command else {
            panic!("expected insights");
        };
        assert_eq!(args.request.location.as_deref(), Some("Cali"));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["sectiond", "check", "-c", "custom.toml"]).unwrap();
        let Commands::Check(arg) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(arg.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["sectiond", "-vv", "check"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_color_never() {
        let cli = Cli::try_parse_from(["sectiond", "--color", "never", "check"]).unwrap();
        assert!(matches!(cli.color, ColorChoice::Never));
    }
}

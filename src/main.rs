use anyhow::Context;
use clap::Parser;
use section_grouping::adapter::inbound::cli::{command::Cli, dispatch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let name = cli.command.name();

    dispatch::run(cli)
        .await
        .with_context(|| format!("sectiond {name} failed"))
}

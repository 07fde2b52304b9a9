use clap::Parser;
use cacher::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.as_path();

    match cli.command {
        Command::Key(args) => cli::key::run(config_dir, args).await,
        Command::Read(args) => cli::read::run(config_dir, args).await,
        Command::Invalidate(args) => cli::invalidate::run(config_dir, args).await,
        Command::Map => cli::map::run(config_dir).await,
        Command::Clear => cli::clear::run(config_dir).await,
    }
}

//! Foreman CLI entry point.

use clap::Parser;

use foreman::cli::{Cli, Commands};
use foreman::domain::models::config::Config;
use foreman::infrastructure::config::ConfigLoader;
use foreman::infrastructure::logging::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config: Config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .unwrap_or_else(|err| foreman::cli::handle_error(err, cli.json));

    let _logger = Logger::init(&config.logging)
        .unwrap_or_else(|err| foreman::cli::handle_error(err, cli.json));

    let result = match cli.command {
        Commands::Run(args) => foreman::cli::commands::run::execute(args, cli.json, config).await,
        Commands::Runs(args) => foreman::cli::commands::runs::execute(args, cli.json, config).await,
        Commands::Show(args) => foreman::cli::commands::show::execute(args, cli.json, config).await,
        Commands::Decide(args) => {
            foreman::cli::commands::decide::execute(args, cli.json, config).await
        }
    };

    if let Err(err) = result {
        foreman::cli::handle_error(err, cli.json);
    }
}

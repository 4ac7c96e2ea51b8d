mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod ui;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 mdprep v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let file_config = config::FileConfig::load(cli.config.as_deref())?;
    let toolchain = config::toolchain(&file_config, cli.gmx.as_deref());

    let command_result = match cli.command {
        Commands::Solvate(args) => {
            info!("Dispatching to 'solvate' command.");
            commands::solvate::run(&toolchain, &file_config, &args)
        }
        Commands::Em(args) => {
            info!("Dispatching to 'em' command.");
            commands::minimize::run(&toolchain, &file_config, &args)
        }
        Commands::Posres(args) => {
            info!("Dispatching to 'posres' command.");
            commands::md::run(&toolchain, &file_config, &args, commands::md::Kind::Restrained)
        }
        Commands::Md(args) => {
            info!("Dispatching to 'md' command.");
            commands::md::run(&toolchain, &file_config, &args, commands::md::Kind::Production)
        }
        Commands::Run(args) => {
            info!("Dispatching to 'run' command.");
            commands::run::run(&toolchain, &file_config, &args)
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
        }
    }

    command_result
}

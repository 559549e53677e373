mod cli;
mod commands;
mod context;
mod logging;
mod output;
mod terminal;

use clap::Parser;
use cli::{Cli, Commands};
use context::Context;
use terminal::EXIT_CANCELLED;
use toolfetch_core::ToolError;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ctx = Context::from_cli(&cli);

    let result = match &cli.command {
        Commands::Ensure {
            tool,
            config,
            yes,
            json,
        } => commands::ensure::run(&ctx, tool, &config.config, *yes, *json),
        Commands::Probe { tool, config, json } => {
            commands::probe::run(&ctx, tool, &config.config, *json)
        }
        Commands::Platform { json } => commands::platform::run(&ctx, *json),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let cancelled = e
            .downcast_ref::<ToolError>()
            .is_some_and(ToolError::is_cancelled);
        std::process::exit(if cancelled { EXIT_CANCELLED } else { 1 });
    }
}

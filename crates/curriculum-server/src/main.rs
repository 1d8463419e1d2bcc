//! Curriculum server - lesson content, practice sandbox and interaction log.

mod cli;
mod commands;
mod logging;
mod server;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.verbose);

    let result = match cli.command {
        Commands::Serve {
            content,
            host,
            port,
            cache_policy,
            cors_origins,
            log_dir,
        } => commands::serve::run(content, host, port, cache_policy, cors_origins, log_dir),

        Commands::Check {
            content,
            json,
            strict,
        } => commands::check::run(content, json, strict, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

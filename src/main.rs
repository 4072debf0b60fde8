use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use leaguedesk::cli::Cli;
use leaguedesk::config::{load_config, print_schema};
use leaguedesk::startup::{self, Outcome};
use leaguedesk::utils::logger::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_schema {
        return match print_schema() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Could not render the config schema: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(command) = cli.command else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    let config = load_config(&cli.config);
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match startup::run(Arc::new(config), command).await {
        Ok(Outcome::Ran) => ExitCode::SUCCESS,
        Ok(Outcome::Redirected(_)) | Ok(Outcome::ConnectionError) => ExitCode::from(3),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

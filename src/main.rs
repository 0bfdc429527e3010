//! `gss-config`: assemble the server configuration from the current
//! environment and report the result.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gss_config::observability::logging;

#[derive(Parser)]
#[command(name = "gss-config")]
#[command(about = "Assemble and inspect the static file server configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the configuration and exit non-zero if it is rejected
    Check,
    /// Print the assembled configuration as JSON
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let config = match gss_config::build() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Check => println!("configuration OK"),
        Commands::Show => match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

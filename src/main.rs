use std::process::ExitCode;

use clap::Parser;
use fse_sync::cli::{self, Cli, commands};
use fse_sync::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli::load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_config(&settings.logging);

    let result = if cli.print_config {
        commands::config::run(&settings)
    } else if let Some(archive) = &cli.once {
        commands::once::run(&settings, archive).await
    } else {
        commands::watch::run(&settings).await
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        ExitCode::FAILURE
    })
}

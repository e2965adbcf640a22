//! attack-eval - Main Entry Point

mod api;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use api::commands;
use attack_eval::constants::{APP_NAME, APP_VERSION};

#[derive(Debug, Parser)]
#[command(name = "attack-eval", version, about = "Score and persist adversarial perturbations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Re-score a dumped perturbation and append the result record
    Evaluate(commands::EvaluateArgs),
    /// Render a dumped perturbation to PNG
    Render(commands::RenderArgs),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("Starting {} v{}", APP_NAME, APP_VERSION);

    let result = match &cli.command {
        Command::Evaluate(args) => commands::evaluate(args).and_then(|record| {
            serde_json::to_string_pretty(&record).map_err(|e| e.to_string())
        }),
        Command::Render(args) => commands::render(args).map(|path| path.display().to_string()),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

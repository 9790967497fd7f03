pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rfv_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "rfv",
    about = "RFV customer segmentation CLI",
    long_about = "Score customers by Recency, Frequency and Value from a purchase table, suggest marketing actions, and export the result.",
    after_help = "Examples:\n  rfv score --input compras.csv --output Segmentacao_RFV.csv\n  rfv validate --input compras.csv\n  rfv config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an rfv.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Score customers and optionally export the graded table")]
    Score(commands::score::ScoreArgs),
    #[command(about = "Check that an input file passes schema and row validation")]
    Validate(commands::validate::ValidateArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    let logging = AppConfig::load(options.clone()).map(|config| config.logging).unwrap_or_default();
    logging::init(&logging);

    let result = match cli.command {
        Command::Score(args) => commands::score::run(&args, options),
        Command::Validate(args) => commands::validate::run(&args, options),
        Command::Config => commands::config::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

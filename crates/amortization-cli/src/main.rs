mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use amortization_core::frequency::FrequencyCatalog;
use commands::frequencies::FrequenciesArgs;
use commands::loans::{CalculateArgs, ChartArgs, ScheduleArgs};

/// Loan payment calculator and amortization schedule generator
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Loan payment calculator and amortization schedule generator",
    long_about = "A CLI for computing level annuity-due loan payments and period-by-period \
                  amortization schedules with decimal precision. Supports extra payments, \
                  rate corrections, tax spreading, chart series, and a configurable \
                  payment frequency catalog."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML or JSON file of payment frequencies (defaults to the standard seven)
    #[arg(long, global = true)]
    frequencies: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the periodic payment for a set of loan terms
    Calculate(CalculateArgs),
    /// Generate the amortization schedule for a stored loan
    Schedule(ScheduleArgs),
    /// Principal and interest series for charting
    Chart(ChartArgs),
    /// Browse or maintain the payment frequency catalog
    Frequencies(FrequenciesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let catalog_path = cli.frequencies.as_deref();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        command => input::catalog::load_catalog(catalog_path)
            .and_then(|mut catalog| dispatch(command, &mut catalog, catalog_path)),
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn dispatch(
    command: Commands,
    catalog: &mut FrequencyCatalog,
    catalog_path: Option<&str>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    match command {
        Commands::Calculate(args) => commands::loans::run_calculate(args, catalog),
        Commands::Schedule(args) => commands::loans::run_schedule(args, catalog),
        Commands::Chart(args) => commands::loans::run_chart(args, catalog),
        Commands::Frequencies(args) => {
            commands::frequencies::run_frequencies(args, catalog, catalog_path)
        }
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}

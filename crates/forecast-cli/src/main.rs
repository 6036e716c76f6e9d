mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::backtest::BacktestArgs;
use commands::debt::DebtScheduleArgs;
use commands::drivers::DriversArgs;
use commands::forecast::{ForecastArgs, ProjectArgs};
use output::OutputFormat;

/// No-plug, no-circularity three-statement forecasts
#[derive(Parser)]
#[command(
    name = "fcst",
    version,
    about = "No-plug, no-circularity three-statement forecasts",
    long_about = "Project income statements, cash budgets, debt ledgers and balance sheets \
                  from historical statements with decimal precision. Every balance sheet \
                  closes without a plug and interest is charged on prior-year balances."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity on stderr (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive forecast drivers from historical statements
    Drivers(DriversArgs),
    /// Forecast from historical statements
    Forecast(ForecastArgs),
    /// Forecast from prepared Year-0 fundamentals and drivers
    Project(ProjectArgs),
    /// Roll a debt ledger through a borrowing plan
    DebtSchedule(DebtScheduleArgs),
    /// Forecast from an earlier year and compare against reported actuals
    Backtest(BacktestArgs),
    /// Print version information
    Version,
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Drivers(args) => commands::drivers::run_drivers(args),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Project(args) => commands::forecast::run_project(args),
        Commands::DebtSchedule(args) => commands::debt::run_debt_schedule(args),
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::Version => {
            println!("fcst {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.render(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use clap::ValueEnum;
use serde_json::Value;

/// How `fcst` prints a command's envelope on stdout.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed envelope
    Json,
    /// Statement grids with forecast years as columns
    Table,
    /// Long format: statement, year, line, value
    Csv,
    /// Headline figure only
    Minimal,
}

impl OutputFormat {
    pub fn render(&self, value: &Value) {
        match self {
            Self::Json => json::print_json(value),
            Self::Table => table::print_table(value),
            Self::Csv => csv_out::print_csv(value),
            Self::Minimal => minimal::print_minimal(value),
        }
    }
}

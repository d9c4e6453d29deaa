//! sheetdb CLI
//!
//! Command-line tools for looking inside sheetdb workbooks without entity
//! descriptors.
//!
//! # Commands
//!
//! - `inspect` - List tables with their header columns and row counts
//! - `dump` - Print the data rows of one table

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sheetdb command-line workbook tools.
#[derive(Parser)]
#[command(name = "sheetdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the workbook file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format shared by the commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables, their columns and row counts
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the data rows of a table
    Dump {
        /// Table (sheet) name
        #[arg(short, long)]
        table: String,

        /// Maximum number of rows to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Workbook path required for inspect")?;
            commands::inspect::run(&path, format)?;
        }
        Commands::Dump {
            table,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Workbook path required for dump")?;
            commands::dump::run(&path, &table, limit, format)?;
        }
        Commands::Version => {
            println!("sheetdb CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("sheetdb Core v{}", sheetdb_core::VERSION);
        }
    }

    Ok(())
}

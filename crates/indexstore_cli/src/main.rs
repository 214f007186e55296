//! IndexStore CLI
//!
//! Command-line tools for inspecting an index store.
//!
//! # Commands
//!
//! - `info` - Display library versions and calling convention
//! - `units` - List unit names
//! - `print-unit` - Dump units with their dependencies and includes
//! - `print-record` - Dump record symbols and occurrences
//! - `unit-name` - Map an output file to its unit name
//! - `purge` - Remove stale data from the store

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use indexstore_core::Store;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Index store command-line tools.
#[derive(Parser)]
#[command(name = "indexstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the index store directory
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Path to libIndexStore; discovered from the environment and toolchain if omitted
    #[arg(global = true, short, long)]
    library: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display library versions and calling convention
    Info,

    /// List unit names
    Units {
        /// List in name order instead of store order
        #[arg(long)]
        sorted: bool,

        /// Skip system units
        #[arg(long)]
        no_system: bool,
    },

    /// Dump a unit, or every unit if no name is given
    PrintUnit {
        /// Unit name
        name: Option<String>,
    },

    /// Dump a record, or every record the units depend on if no name is given
    PrintRecord {
        /// Record name
        name: Option<String>,
    },

    /// Print the unit name recorded for an output file
    UnitName {
        /// Output file path as passed to the compiler
        output_path: PathBuf,
    },

    /// Remove data no unit refers to
    Purge,
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

    let library = commands::load_library(cli.library.as_deref())?;
    let format = cli.format;
    let open_store = || -> Result<Store, Box<dyn std::error::Error>> {
        let path = cli.store.as_deref().ok_or("Store path required")?;
        Ok(commands::open_store(&library, path)?)
    };

    match cli.command {
        Commands::Info => {
            commands::info::run(&library, format)?;
        }
        Commands::Units { sorted, no_system } => {
            commands::units::run(&open_store()?, sorted, !no_system, format)?;
        }
        Commands::PrintUnit { ref name } => {
            commands::print_unit::run(&open_store()?, name.as_deref(), format)?;
        }
        Commands::PrintRecord { ref name } => {
            commands::print_record::run(&open_store()?, name.as_deref(), format)?;
        }
        Commands::UnitName { ref output_path } => {
            commands::unit_name::run(&open_store()?, output_path, format)?;
        }
        Commands::Purge => {
            commands::purge::run(&open_store()?, format)?;
        }
    }

    Ok(())
}

//! minidb CLI
//!
//! Inspects the tables of a minidb SQLite database

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "minidb")]
#[command(about = "minidb - inspect a minidb SQLite database", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: commands::StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List tables with their columns
    Tables(commands::tables::TablesArgs),
    /// Count the rows of a table
    Count(commands::count::CountArgs),
    /// Print the rows of a table as JSON lines
    Dump(commands::dump::DumpArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.store.debug {
        minidb_core::logging_facility::init(minidb_core::logging_facility::Profile::Development);
    }

    let result = match cli.command {
        Commands::Tables(args) => commands::tables::execute(&cli.store, args),
        Commands::Count(args) => commands::count::execute(&cli.store, args),
        Commands::Dump(args) => commands::dump::execute(&cli.store, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

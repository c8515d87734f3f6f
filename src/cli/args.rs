//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    add::AddArgs,
    attach::AttachArgs,
    completions::CompletionsArgs,
    config::ConfigCommands,
    delete::DeleteArgs,
    edit::EditArgs,
    export::ExportArgs,
    import::ImportArgs,
    init::InitArgs,
    list::ListArgs,
    search::SearchArgs,
    values::ValuesArgs,
};

#[derive(Parser)]
#[command(name = "roomcat")]
#[command(author, version, about = "Rental room catalog")]
#[command(long_about = "Keep a catalog of rental room listings in a spreadsheet, with a local CSV file as fallback, and search it from the command line.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .roomcat/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new catalog project
    Init(InitArgs),

    /// Add one or more rooms at an address
    Add(AddArgs),

    /// List all listings, newest first
    List(ListArgs),

    /// Search listings, earliest available first
    Search(SearchArgs),

    /// Delete a listing by ID
    Delete(DeleteArgs),

    /// Attach photo references to a listing
    Attach(AttachArgs),

    /// Edit fields of a listing
    Edit(EditArgs),

    /// Export listings as CSV
    Export(ExportArgs),

    /// Import listings from a CSV file
    Import(ImportArgs),

    /// Show the distinct values of a field
    Values(ValuesArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for terminals
    #[default]
    Auto,
    /// Table with the main columns
    Table,
    /// CSV with every stored column
    Csv,
    /// JSON array of listings
    Json,
    /// Just IDs, one per line
    Id,
}

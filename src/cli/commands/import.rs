//! `roomcat import` command - Merge or replace listings from a CSV file

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::catalog::{self, ImportMode};
use crate::core::transfer::read_import;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// How imported rows combine with the catalog
    #[arg(long, value_enum, default_value_t = ImportMode::Merge)]
    pub mode: ImportMode,

    /// Parse the file and report what would be imported, without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let incoming = read_import(&args.file).map_err(|e| miette::miette!("{}", e))?;

    if args.dry_run {
        let missing = incoming
            .records
            .iter()
            .filter(|r| r.id.as_u64().is_none())
            .count();
        println!(
            "{} {} row(s) read from {}, {} without a usable ID",
            style("i").blue(),
            incoming.len(),
            style(args.file.display()).cyan(),
            missing
        );
        return Ok(());
    }

    let (_project, mut store) = open_store(global)?;
    let outcome = catalog::import(&mut store, incoming, args.mode).map_err(store_error)?;
    print_warnings(&outcome.warnings);
    let report = outcome.value;

    if !global.quiet {
        let verb = match report.mode {
            ImportMode::Merge => "Merged",
            ImportMode::Overwrite => "Replaced catalog with",
        };
        println!(
            "{} {} {} listing(s); catalog now has {}",
            style("✓").green(),
            verb,
            report.imported,
            report.total
        );
        if !report.assigned.is_empty() {
            let ids: Vec<String> = report.assigned.iter().map(u64::to_string).collect();
            println!("  {} {}", style("New IDs:").dim(), ids.join(", "));
        }
    }
    Ok(())
}

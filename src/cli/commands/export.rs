//! `roomcat export` command - Write listings to a CSV file

use console::style;
use miette::Result;
use std::io;
use std::path::PathBuf;

use crate::cli::commands::search::FilterArgs;
use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::transfer::{export_csv, export_to_path};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let loaded = store.load().map_err(store_error)?;
    print_warnings(&loaded.warnings);
    let table = loaded.value;

    let records = args.filter.to_filter().apply(&table.records);

    match &args.output {
        Some(path) => {
            let count =
                export_to_path(&table, &records, path).map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!(
                    "{} Exported {} listing(s) to {}",
                    style("✓").green(),
                    count,
                    style(path.display()).cyan()
                );
            }
        }
        None => {
            export_csv(&table, &records, io::stdout().lock())
                .map_err(|e| miette::miette!("{}", e))?;
        }
    }
    Ok(())
}

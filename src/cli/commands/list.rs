//! `roomcat list` command - Administrative listing, newest first

use miette::Result;

use crate::cli::helpers::{open_store, print_records, print_warnings, store_error};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only the count of listings
    #[arg(long)]
    pub count: bool,

    /// Mask house numbers
    #[arg(long)]
    pub staff: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let loaded = store.load().map_err(store_error)?;
    print_warnings(&loaded.warnings);
    let table = loaded.value;

    if args.count {
        println!("{}", table.len());
        return Ok(());
    }

    let mut records = table.newest_first();
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    print_records(&table, &records, global.format, args.staff)
}

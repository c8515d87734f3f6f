//! `roomcat attach` command - Append photo references to a listing

use console::style;
use miette::Result;

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::catalog;

#[derive(clap::Args, Debug)]
pub struct AttachArgs {
    /// Listing ID
    pub id: u64,

    /// Photo paths or URLs, stored as given
    #[arg(required = true)]
    pub photos: Vec<String>,
}

pub fn run(args: AttachArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let count = args.photos.len();

    let outcome = catalog::attach_photos(&mut store, args.id, args.photos).map_err(store_error)?;
    print_warnings(&outcome.warnings);

    if !global.quiet {
        println!(
            "{} Attached {} photo(s) to listing {} ({} total)",
            style("✓").green(),
            count,
            style(args.id).cyan(),
            outcome.value.photos.len()
        );
    }
    Ok(())
}

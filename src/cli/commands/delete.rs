//! `roomcat delete` command - Remove a listing

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::catalog;
use crate::core::present::address_line;
use crate::core::storage::{Outcome, Store, StoreError};

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Listing ID
    pub id: u64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;

    if !args.yes {
        if !Term::stderr().is_term() {
            return Err(miette::miette!(
                help = "pass --yes to delete without a prompt",
                "refusing to delete listing {} without confirmation",
                args.id
            ));
        }
        let prompt = confirmation_prompt(&mut store, args.id)?;
        print_warnings(&prompt.warnings);
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.value)
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{} Nothing deleted", style("!").yellow());
            return Ok(());
        }
    }

    let outcome = catalog::delete(&mut store, args.id).map_err(store_error)?;
    print_warnings(&outcome.warnings);

    if !global.quiet {
        println!(
            "{} Deleted listing {} ({})",
            style("✓").green(),
            style(args.id).cyan(),
            address_line(&outcome.value, false)
        );
    }
    Ok(())
}

/// Load the catalog and describe the listing about to be deleted
fn confirmation_prompt(store: &mut Store, id: u64) -> Result<Outcome<String>> {
    let loaded = store.load().map_err(store_error)?;
    let record = loaded
        .value
        .get(id)
        .ok_or_else(|| store_error(StoreError::NotFound { id }))?;
    let prompt = format!(
        "Delete listing {} ({} {})?",
        id,
        address_line(record, false),
        record.room_code
    );
    Ok(Outcome {
        value: prompt,
        warnings: loaded.warnings,
    })
}

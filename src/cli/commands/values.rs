//! `roomcat values` command - Distinct values of a field

use clap::ValueEnum;
use miette::Result;

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::record::ScalarField;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueField {
    District,
    Ward,
    Street,
    Window,
}

impl ValueField {
    fn scalar(self) -> ScalarField {
        match self {
            ValueField::District => ScalarField::District,
            ValueField::Ward => ScalarField::Ward,
            ValueField::Street => ScalarField::Street,
            ValueField::Window => ScalarField::WindowType,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ValuesArgs {
    /// Field to list
    #[arg(value_enum)]
    pub field: ValueField,
}

pub fn run(args: ValuesArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let loaded = store.load().map_err(store_error)?;
    print_warnings(&loaded.warnings);

    for value in loaded.value.distinct(args.field.scalar()) {
        println!("{}", value);
    }
    Ok(())
}

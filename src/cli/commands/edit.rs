//! `roomcat edit` command - Change fields of one listing

use console::style;
use miette::Result;

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::catalog;
use crate::core::codec::Cell;
use crate::core::present::share_text;
use crate::core::schema::{apply_cell, parse_date, parse_price, Column, ColumnKind};

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Listing ID
    pub id: u64,

    /// Field assignment as COLUMN=VALUE (repeatable); COLUMN is a key such
    /// as `price` or a stored header such as `Giá`. List fields take a JSON
    /// array or comma-separated values; an empty value clears the field.
    #[arg(long = "set", value_parser = parse_assignment, required = true)]
    pub assignments: Vec<Assignment>,
}

/// One validated `COLUMN=VALUE` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: Column,
    pub value: String,
}

fn parse_assignment(s: &str) -> Result<Assignment, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", s))?;
    let column =
        Column::from_header(name).ok_or_else(|| format!("unknown column '{}'", name.trim()))?;
    let value = value.trim().to_string();

    match column.kind() {
        ColumnKind::Id | ColumnKind::Timestamp => {
            return Err(format!("'{}' cannot be edited", column.key()));
        }
        ColumnKind::Price if !value.is_empty() && parse_price(&value).is_none() => {
            return Err(format!("invalid price: '{}'", value));
        }
        ColumnKind::Date if !value.is_empty() && parse_date(&value).is_none() => {
            return Err(format!("invalid date: '{}'", value));
        }
        _ => {}
    }
    Ok(Assignment { column, value })
}

pub fn run(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let assignments = args.assignments;

    let outcome = catalog::update(&mut store, args.id, |record| {
        for assignment in assignments {
            apply_cell(record, assignment.column, Cell::from_text(assignment.value));
        }
    })
    .map_err(store_error)?;
    print_warnings(&outcome.warnings);

    if !global.quiet {
        println!(
            "{} Updated listing {}",
            style("✓").green(),
            style(args.id).cyan()
        );
        println!();
        println!("{}", share_text(&outcome.value, false));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let a = parse_assignment("price=5000000").unwrap();
        assert_eq!(a.column, Column::Price);
        assert_eq!(a.value, "5000000");

        let a = parse_assignment("Tiện ích = Wifi, Thang máy").unwrap();
        assert_eq!(a.column, Column::Amenities);
        assert_eq!(a.value, "Wifi, Thang máy");

        assert_eq!(parse_assignment("price=").unwrap().value, "");
    }

    #[test]
    fn test_parse_assignment_rejects_bad_input() {
        assert!(parse_assignment("price").is_err());
        assert!(parse_assignment("colour=red").is_err());
        assert!(parse_assignment("id=4").is_err());
        assert!(parse_assignment("created_at=2025-01-01").is_err());
        assert!(parse_assignment("price=cheap").is_err());
        assert!(parse_assignment("available_date=soon").is_err());
    }
}

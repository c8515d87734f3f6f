//! Shared helper functions for CLI commands
//!
//! Project/store opening, warning output and record rendering used by
//! several command modules.

use std::io;

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::codec::join_human;
use crate::core::present::{address_line, format_price, share_text, DISPLAY_DATE_FORMAT};
use crate::core::project::Project;
use crate::core::record::Record;
use crate::core::storage::{Store, StoreError, StoreWarning};
use crate::core::table::Table;
use crate::core::transfer::write_csv;

/// The project named by `--project`, or the one containing the working directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    }
    .map_err(|e| miette::miette!("{}", e))
}

pub fn open_store(global: &GlobalOpts) -> Result<(Project, Store)> {
    let project = open_project(global)?;
    let store = Store::open(&project);
    Ok((project, store))
}

/// Report fallbacks on stderr; they are shown even with `--quiet`
pub fn print_warnings(warnings: &[StoreWarning]) {
    for warning in warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), style(warning).yellow());
    }
}

/// Turn a storage failure into a diagnostic, phrased by severity
pub fn store_error(err: StoreError) -> miette::Report {
    if err.is_fatal() {
        miette::miette!("{}", err)
    } else {
        miette::miette!(help = "nothing was changed", "{}", err)
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Render listings in the requested format
///
/// With `staff`, table rows mask the house number and the default output is
/// the share text of each listing.
pub fn print_records(
    layout: &Table,
    records: &[&Record],
    format: OutputFormat,
    staff: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            write_csv(layout, records, io::stdout().lock()).map_err(|e| miette::miette!("{}", e))?;
        }
        OutputFormat::Id => {
            for record in records {
                println!("{}", record.id);
            }
        }
        OutputFormat::Auto if staff => {
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", share_text(record, true));
            }
        }
        OutputFormat::Auto | OutputFormat::Table => {
            if records.is_empty() {
                println!("No listings found.");
                return Ok(());
            }
            println!("{}", record_table(records, staff));
            println!(
                "{}",
                style(format!("{} listing(s)", records.len())).dim()
            );
        }
    }
    Ok(())
}

fn record_table(records: &[&Record], masked: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "ID", "Address", "Room", "Price", "Type", "Window", "Available", "Created",
    ]);
    for record in records {
        builder.push_record([
            record.id.to_string(),
            truncate_str(&address_line(record, masked), 40),
            record.room_code.clone(),
            record.price.map(format_price).unwrap_or_default(),
            truncate_str(&join_human(&record.room_type), 20),
            truncate_str(&record.window_type, 16),
            format_date(record.available_date),
            record
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordId;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("Gò Vấp Gò Vấp", 6), "Gò ...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2025, 3, 1)), "01/03/2025");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_record_table_masks_for_staff() {
        let record = Record {
            id: RecordId::Numeric(4),
            house_number: "1897".into(),
            street: "Quang Trung".into(),
            price: Some(3_200_000),
            ..Default::default()
        };
        let masked = record_table(&[&record], true);
        assert!(masked.contains("18xx Quang Trung"));
        assert!(masked.contains("3,200,000"));
        assert!(!masked.contains("1897"));

        let full = record_table(&[&record], false);
        assert!(full.contains("1897 Quang Trung"));
    }
}

//! CSV export and import
//!
//! Exports carry a UTF-8 byte-order mark so spreadsheet tools pick the
//! right encoding. Multi-valued fields are written in their stored (JSON
//! array) form, the same as the data file, so an export can be imported
//! back unchanged.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use thiserror::Error;
use tracing::debug;

use crate::core::record::Record;
use crate::core::schema::{denormalize, normalize};
use crate::core::storage::read_grid;
use crate::core::table::Table;

const BOM: &[u8] = "\u{feff}".as_bytes();

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path:?} is not a valid CSV table: {source}")]
    Parse { path: PathBuf, source: csv::Error },

    #[error("cannot write export: {0}")]
    Write(#[from] csv::Error),

    #[error("cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `records` as BOM-prefixed CSV, using `layout` for unknown columns
pub fn export_csv<W: Write>(
    layout: &Table,
    records: &[&Record],
    mut out: W,
) -> Result<usize, TransferError> {
    out.write_all(BOM)?;
    let count = write_csv(layout, records, out)?;
    debug!(rows = count, "exported listings");
    Ok(count)
}

/// Write `records` as plain CSV with the stored header row
pub fn write_csv<W: Write>(
    layout: &Table,
    records: &[&Record],
    out: W,
) -> Result<usize, TransferError> {
    let selected = layout.with_records(records.iter().map(|r| (*r).clone()).collect());
    let raw = denormalize(&selected);

    let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
    for row in raw.to_grid() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(raw.rows.len())
}

/// Export to a file, replacing it
pub fn export_to_path(
    layout: &Table,
    records: &[&Record],
    path: &Path,
) -> Result<usize, TransferError> {
    let file = fs::File::create(path)?;
    export_csv(layout, records, file)
}

/// Parse CSV text into a table of the catalog's shape
///
/// Rows with every cell blank are padding left by spreadsheet tools and are
/// not imported.
pub fn parse_import(content: &str, origin: &Path) -> Result<Table, TransferError> {
    let mut raw = read_grid(content).map_err(|source| TransferError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    raw.rows.retain(|row| row.iter().any(|cell| !cell.is_blank()));
    Ok(normalize(raw))
}

/// Read an externally supplied CSV file for import
pub fn read_import(path: &Path) -> Result<Table, TransferError> {
    let bytes = fs::read(path).map_err(|source| TransferError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    let table = parse_import(&content, path)?;
    debug!(path = %path.display(), rows = table.len(), "read import file");
    Ok(table)
}

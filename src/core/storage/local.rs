//! Local data file backend
//!
//! One CSV file with the header row first. Multi-valued columns hold JSON
//! arrays and dates are written as `YYYY-MM-DD`. A missing file is created
//! with the expected header and no rows.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, info};

use crate::core::schema::RawTable;

use super::{Backend, StoreError};

const BOM: char = '\u{feff}';

pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with the expected empty schema if it does not exist
    ///
    /// Returns `true` when a new file was written.
    pub fn ensure_exists(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        info!(path = %self.path.display(), "creating empty data file");
        self.write(&RawTable::empty_schema())?;
        Ok(true)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write to a sibling temp file, then rename over the data file
    fn write(&self, table: &RawTable) -> Result<(), StoreError> {
        let temp = self.temp_path();
        let result = self.write_to(&temp, table).and_then(|()| {
            fs::rename(&temp, &self.path).map_err(|source| self.io_error(source))
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    fn write_to(&self, target: &Path, table: &RawTable) -> Result<(), StoreError> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(target)
            .map_err(|e| self.csv_error(e))?;
        for row in table.to_grid() {
            writer.write_record(&row).map_err(|e| self.csv_error(e))?;
        }
        writer.flush().map_err(|source| self.io_error(source))
    }
}

impl Backend for LocalFile {
    fn name(&self) -> &str {
        "local file"
    }

    fn load(&self) -> Result<RawTable, StoreError> {
        self.ensure_exists()?;
        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        let table = read_grid(&content).map_err(|e| self.csv_error(e))?;
        debug!(path = %self.path.display(), rows = table.rows.len(), "read data file");
        Ok(table)
    }

    fn save(&self, table: &RawTable) -> Result<(), StoreError> {
        self.write(table)?;
        debug!(path = %self.path.display(), rows = table.rows.len(), "wrote data file");
        Ok(())
    }
}

/// Parse CSV text (optionally BOM-prefixed) into a raw table
///
/// An empty file reads as the expected empty schema.
pub(crate) fn read_grid(content: &str) -> Result<RawTable, csv::Error> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(String::from).collect::<Vec<_>>());
    }

    if grid.is_empty() {
        return Ok(RawTable::empty_schema());
    }
    Ok(RawTable::from_grid(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::Cell;
    use crate::core::schema::Column;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_with_schema() {
        let tmp = tempdir().unwrap();
        let backend = LocalFile::new(tmp.path().join("nested/listings.csv"));

        let table = backend.load().unwrap();
        assert_eq!(table.headers, Column::headers());
        assert!(table.rows.is_empty());

        let content = fs::read_to_string(backend.path()).unwrap();
        assert!(content.starts_with("ID,Số nhà,Đường"));
        assert!(!backend.ensure_exists().unwrap());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempdir().unwrap();
        let backend = LocalFile::new(tmp.path().join("listings.csv"));
        let table = RawTable {
            headers: vec!["ID".into(), "Tiện ích".into(), "Ghi chú".into()],
            rows: vec![vec![
                Cell::Scalar("1".into()),
                Cell::Scalar("[\"Camera 24/7\",\"Thang máy\"]".into()),
                Cell::Scalar("gần chợ, yên tĩnh\n\"đẹp\"".into()),
            ]],
        };
        backend.save(&table).unwrap();
        assert_eq!(backend.load().unwrap(), table);
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn test_read_grid_strips_bom_and_pads_rows() {
        let table = read_grid("\u{feff}ID,Quận\n1\n2,Q3\n").unwrap();
        assert_eq!(table.headers, vec!["ID", "Quận"]);
        assert_eq!(table.rows[0], vec![Cell::Scalar("1".into()), Cell::Empty]);
        assert_eq!(table.rows[1][1], Cell::Scalar("Q3".into()));
    }

    #[test]
    fn test_read_grid_empty_content() {
        assert_eq!(read_grid("").unwrap(), RawTable::empty_schema());
    }
}

//! Remote spreadsheet backend
//!
//! The remote service is treated as an opaque store of rows: one named
//! worksheet inside one spreadsheet, read whole and overwritten whole.
//! [`SheetService`] is that contract; [`Connector`] opens an authenticated
//! session for a given configuration.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::RemoteSettings;
use crate::core::schema::RawTable;

use super::{Backend, StoreError};

/// Errors raised by the remote spreadsheet service
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("cannot use credential bundle {path:?}: {message}")]
    Credentials { path: PathBuf, message: String },

    #[error("cannot find a spreadsheet id in {0:?}")]
    BadLocator(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("{0}")]
    Service(String),
}

/// Whole-worksheet operations on one spreadsheet
pub trait SheetService {
    fn worksheet_exists(&self, title: &str) -> Result<bool, RemoteError>;

    fn add_worksheet(&self, title: &str) -> Result<(), RemoteError>;

    /// Every non-empty row, header first
    fn read_values(&self, title: &str) -> Result<Vec<Vec<String>>, RemoteError>;

    fn clear(&self, title: &str) -> Result<(), RemoteError>;

    /// Write `rows` starting at the top-left cell
    fn write_values(&self, title: &str, rows: &[Vec<String>]) -> Result<(), RemoteError>;
}

/// Opens authenticated sessions against a spreadsheet service
pub trait Connector {
    /// Whether this connector can be used at all in this build/environment
    fn is_available(&self) -> bool {
        true
    }

    fn connect(&self, settings: &RemoteSettings) -> Result<Box<dyn SheetService>, RemoteError>;
}

/// Connects to the Google Sheets REST API
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, settings: &RemoteSettings) -> Result<Box<dyn SheetService>, RemoteError> {
        Ok(Box::new(super::GoogleSheets::connect(settings)?))
    }
}

/// The catalog stored in a named worksheet
pub struct RemoteSheet<'a> {
    connector: &'a dyn Connector,
    settings: RemoteSettings,
    worksheet: String,
}

impl<'a> RemoteSheet<'a> {
    pub fn new(connector: &'a dyn Connector, settings: RemoteSettings, worksheet: &str) -> Self {
        Self {
            connector,
            settings,
            worksheet: worksheet.to_string(),
        }
    }

    /// Connect and make sure the worksheet exists
    fn session(&self) -> Result<Box<dyn SheetService>, RemoteError> {
        let service = self.connector.connect(&self.settings)?;
        if !service.worksheet_exists(&self.worksheet)? {
            info!(worksheet = %self.worksheet, "creating missing worksheet");
            service.add_worksheet(&self.worksheet)?;
        }
        Ok(service)
    }
}

/// What a connection check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetStatus {
    pub worksheet: String,
    pub exists: bool,
    /// Data rows below the header
    pub rows: usize,
}

impl RemoteSheet<'_> {
    /// Connect and look at the worksheet without creating or changing it
    pub fn check(&self) -> Result<SheetStatus, RemoteError> {
        let service = self.connector.connect(&self.settings)?;
        let exists = service.worksheet_exists(&self.worksheet)?;
        let rows = if exists {
            service.read_values(&self.worksheet)?.len().saturating_sub(1)
        } else {
            0
        };
        Ok(SheetStatus {
            worksheet: self.worksheet.clone(),
            exists,
            rows,
        })
    }
}

impl Backend for RemoteSheet<'_> {
    fn name(&self) -> &str {
        "remote spreadsheet"
    }

    fn load(&self) -> Result<RawTable, StoreError> {
        let service = self.session()?;
        let grid = service.read_values(&self.worksheet)?;
        debug!(worksheet = %self.worksheet, rows = grid.len(), "read worksheet");
        if grid.is_empty() {
            return Ok(RawTable::empty_schema());
        }
        Ok(RawTable::from_grid(grid))
    }

    fn save(&self, table: &RawTable) -> Result<(), StoreError> {
        let service = self.session()?;
        let grid = table.to_grid();
        service.clear(&self.worksheet)?;
        service.write_values(&self.worksheet, &grid)?;
        debug!(worksheet = %self.worksheet, rows = grid.len(), "overwrote worksheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A spreadsheet holding only the `data` worksheet, recording every call
    #[derive(Clone, Default)]
    struct OneSheet {
        rows: Vec<Vec<String>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl OneSheet {
        fn log(&self, call: &str, title: &str) {
            self.calls.borrow_mut().push(format!("{} {}", call, title));
        }
    }

    impl SheetService for OneSheet {
        fn worksheet_exists(&self, title: &str) -> Result<bool, RemoteError> {
            self.log("exists", title);
            Ok(title == "data")
        }

        fn add_worksheet(&self, title: &str) -> Result<(), RemoteError> {
            self.log("add", title);
            Ok(())
        }

        fn read_values(&self, title: &str) -> Result<Vec<Vec<String>>, RemoteError> {
            self.log("read", title);
            Ok(if title == "data" { self.rows.clone() } else { Vec::new() })
        }

        fn clear(&self, _title: &str) -> Result<(), RemoteError> {
            Err(RemoteError::Service("read-only".into()))
        }

        fn write_values(&self, _title: &str, _rows: &[Vec<String>]) -> Result<(), RemoteError> {
            Err(RemoteError::Service("read-only".into()))
        }
    }

    impl Connector for OneSheet {
        fn connect(&self, _settings: &RemoteSettings) -> Result<Box<dyn SheetService>, RemoteError> {
            Ok(Box::new(self.clone()))
        }
    }

    #[test]
    fn test_existing_worksheet_is_read_without_creating() {
        let sheet = OneSheet {
            rows: vec![
                vec!["ID".into(), "Đường".into()],
                vec!["1".into(), "Quang Trung".into()],
            ],
            ..Default::default()
        };
        let remote = RemoteSheet::new(&sheet, RemoteSettings::default(), "data");

        let table = remote.load().unwrap();
        assert_eq!(table.headers, vec!["ID", "Đường"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(*sheet.calls.borrow(), vec!["exists data", "read data"]);
    }

    #[test]
    fn test_missing_worksheet_is_created_and_reads_as_empty_schema() {
        let sheet = OneSheet::default();
        let remote = RemoteSheet::new(&sheet, RemoteSettings::default(), "rooms");

        let table = remote.load().unwrap();
        assert_eq!(table.headers, RawTable::empty_schema().headers);
        assert!(table.rows.is_empty());
        assert_eq!(
            *sheet.calls.borrow(),
            vec!["exists rooms", "add rooms", "read rooms"]
        );
    }

    #[test]
    fn test_check_reports_rows_and_never_creates() {
        let sheet = OneSheet {
            rows: vec![
                vec!["ID".into()],
                vec!["1".into()],
                vec!["2".into()],
            ],
            ..Default::default()
        };
        let status = RemoteSheet::new(&sheet, RemoteSettings::default(), "data")
            .check()
            .unwrap();
        assert_eq!(
            status,
            SheetStatus {
                worksheet: "data".into(),
                exists: true,
                rows: 2,
            }
        );

        let status = RemoteSheet::new(&sheet, RemoteSettings::default(), "rooms")
            .check()
            .unwrap();
        assert!(!status.exists);
        assert_eq!(status.rows, 0);
        assert!(!sheet.calls.borrow().iter().any(|c| c.starts_with("add")));
    }

    #[test]
    fn test_service_errors_surface_as_remote_store_errors() {
        let sheet = OneSheet::default();
        let remote = RemoteSheet::new(&sheet, RemoteSettings::default(), "data");

        let err = remote.save(&RawTable::empty_schema()).unwrap_err();
        assert!(matches!(err, StoreError::Remote(_)));
        assert!(err.to_string().contains("read-only"));
    }
}

//! Storage adapter: load and save the whole catalog
//!
//! Backends form an ordered chain. The remote spreadsheet comes first when
//! it is configured; the local data file always comes last. A failure in any
//! backend before the last one turns into a [`StoreWarning`] and the same
//! operation is retried further down the chain. A failure in the local file
//! is returned to the caller.
//!
//! Saves always write the complete table. There is no row-level update.
//!
//! When a save falls back to the local file, a marker is left next to it
//! (`<data file>.unsynced`). While the marker exists, loads skip the remote
//! sheet and read the local file, since the sheet is missing the latest
//! save or was cleared by a half-finished one. The next save that reaches
//! the remote sheet removes the marker.

mod local;
mod remote;
mod sheets;

pub use local::LocalFile;
pub(crate) use local::read_grid;
pub use remote::{Connector, HttpConnector, RemoteError, RemoteSheet, SheetService, SheetStatus};
pub use sheets::{spreadsheet_id_from_url, GoogleSheets};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::project::Project;
use crate::core::schema::{denormalize, normalize, RawTable};
use crate::core::table::Table;

/// Uniform load/save contract over a single storage location
pub trait Backend {
    /// Short human-readable name used in warnings and logs
    fn name(&self) -> &str;

    /// Read the full sheet
    fn load(&self) -> Result<RawTable, StoreError>;

    /// Replace the full sheet with `table`
    fn save(&self, table: &RawTable) -> Result<(), StoreError>;
}

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access data file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse data file {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("remote spreadsheet: {0}")]
    Remote(#[from] RemoteError),

    #[error("no listing with ID {id}")]
    NotFound { id: u64 },
}

impl StoreError {
    /// Whether the requested operation had to be abandoned
    ///
    /// Remote failures are recovered by the local fallback, and a missing id
    /// leaves the catalog untouched.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StoreError::Remote(_) | StoreError::NotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Load => write!(f, "load"),
            Operation::Save => write!(f, "save"),
        }
    }
}

/// Suffix of the marker left next to the data file after a fallback save
pub const UNSYNCED_SUFFIX: &str = ".unsynced";

/// A backend failed or was skipped and the operation moved on to the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWarning {
    pub backend: String,
    pub fallback: String,
    pub operation: Operation,
    pub message: String,
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} did not complete ({}); used {} instead",
            self.operation, self.backend, self.message, self.fallback
        )
    }
}

/// A successful result plus any fallbacks taken on the way
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<StoreWarning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Put earlier warnings in front of this outcome's own
    pub fn after(mut self, mut earlier: Vec<StoreWarning>) -> Self {
        earlier.append(&mut self.warnings);
        self.warnings = earlier;
        self
    }
}

struct CachedTable {
    loaded_at: Instant,
    table: Table,
}

/// Handle to the catalog's storage
///
/// Built from a project root and its configuration. Backend selection is
/// re-evaluated on every operation; with [`Store::open`] the configuration
/// files are re-read too, so a remote sheet configured while the store is
/// alive is picked up by the next call.
pub struct Store {
    root: PathBuf,
    config: Config,
    reload_config: bool,
    connector: Box<dyn Connector>,
    cache: Option<CachedTable>,
}

impl Store {
    /// Open the store of a project, following its layered configuration
    pub fn open(project: &Project) -> Self {
        let root = project.root().to_path_buf();
        let config = Config::load_for(&root);
        Self {
            root,
            config,
            reload_config: true,
            connector: Box::new(HttpConnector),
            cache: None,
        }
    }

    /// A store with a fixed configuration
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
            reload_config: false,
            connector: Box::new(HttpConnector),
            cache: None,
        }
    }

    /// Replace how remote spreadsheet sessions are opened
    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Box::new(connector);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap in a new configuration; takes effect on the next operation
    pub fn reconfigure(&mut self, config: Config) {
        self.config = config;
        self.cache = None;
    }

    /// Drop any cached table so the next load hits storage
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Path of the local data file under the current configuration
    pub fn data_path(&self) -> PathBuf {
        self.config.data_path(&self.root)
    }

    /// Marker file present while the local file is newer than the remote sheet
    pub fn unsynced_path(&self) -> PathBuf {
        let mut name = self.data_path().into_os_string();
        name.push(UNSYNCED_SUFFIX);
        PathBuf::from(name)
    }

    /// Whether the last save missed the remote spreadsheet
    pub fn has_unsynced_changes(&self) -> bool {
        self.unsynced_path().exists()
    }

    /// Whether the next operation will try the remote spreadsheet first
    pub fn remote_preferred(&self) -> bool {
        self.config.remote.is_configured() && self.connector.is_available()
    }

    /// Connect to the configured remote spreadsheet and report on the worksheet
    ///
    /// Nothing is created or written, and no fallback is taken.
    pub fn check_remote(&mut self) -> Result<SheetStatus, StoreError> {
        self.refresh_config();
        if !self.config.remote.is_configured() {
            return Err(RemoteError::NotConfigured(
                "set remote.credentials and remote.sheet_id or remote.sheet_url".into(),
            )
            .into());
        }
        let sheet = RemoteSheet::new(
            self.connector.as_ref(),
            self.config.remote.resolved(&self.root),
            self.config.worksheet(),
        );
        Ok(sheet.check()?)
    }

    /// Load and normalize the full catalog
    pub fn load(&mut self) -> Result<Outcome<Table>, StoreError> {
        self.refresh_config();

        let ttl = self.config.cache_ttl();
        if let Some(cached) = &self.cache {
            if cached.loaded_at.elapsed() < ttl {
                debug!(records = cached.table.len(), "serving catalog from cache");
                return Ok(Outcome::new(cached.table.clone()));
            }
        }

        let outcome = self.run(Operation::Load, |backend| backend.load())?;
        let table = normalize(outcome.value);
        debug!(records = table.len(), "catalog loaded");

        self.cache = if ttl > Duration::ZERO {
            Some(CachedTable {
                loaded_at: Instant::now(),
                table: table.clone(),
            })
        } else {
            None
        };

        Ok(Outcome {
            value: table,
            warnings: outcome.warnings,
        })
    }

    /// Encode and write the full catalog, replacing what is stored
    pub fn save(&mut self, table: &Table) -> Result<Outcome<()>, StoreError> {
        self.refresh_config();
        self.cache = None;

        let raw = denormalize(table);
        let outcome = self.run(Operation::Save, |backend| backend.save(&raw))?;
        info!(records = table.len(), "catalog saved");
        Ok(outcome)
    }

    fn refresh_config(&mut self) {
        if !self.reload_config {
            return;
        }
        let fresh = Config::load_for(&self.root);
        if fresh != self.config {
            debug!("configuration changed, dropping cached catalog");
            self.config = fresh;
            self.cache = None;
        }
    }

    /// Backends tried before the local file, in order
    fn preferred_backends(&self) -> Vec<Box<dyn Backend + '_>> {
        let mut chain: Vec<Box<dyn Backend + '_>> = Vec::new();
        if self.remote_preferred() {
            chain.push(Box::new(RemoteSheet::new(
                self.connector.as_ref(),
                self.config.remote.resolved(&self.root),
                self.config.worksheet(),
            )));
        } else if self.config.remote.is_configured() {
            debug!("remote spreadsheet configured but no connector available");
        }
        chain
    }

    fn run<T>(
        &self,
        operation: Operation,
        attempt: impl Fn(&dyn Backend) -> Result<T, StoreError>,
    ) -> Result<Outcome<T>, StoreError> {
        let local = LocalFile::new(self.data_path());
        let mut warnings = Vec::new();
        let chain = self.preferred_backends();

        if operation == Operation::Load && !chain.is_empty() && self.has_unsynced_changes() {
            for backend in &chain {
                warn!(
                    backend = backend.name(),
                    "local data file is newer than the remote, skipping it"
                );
                warnings.push(StoreWarning {
                    backend: backend.name().to_string(),
                    fallback: local.name().to_string(),
                    operation,
                    message: "skipped, it is missing the last save".to_string(),
                });
            }
        } else {
            for backend in chain.iter() {
                debug!(backend = backend.name(), %operation, "trying backend");
                match attempt(&**backend) {
                    Ok(value) => {
                        if operation == Operation::Save {
                            self.clear_unsynced();
                        }
                        return Ok(Outcome { value, warnings });
                    }
                    Err(err) => {
                        warn!(
                            backend = backend.name(),
                            %operation,
                            error = %err,
                            "backend failed, falling back"
                        );
                        warnings.push(StoreWarning {
                            backend: backend.name().to_string(),
                            fallback: local.name().to_string(),
                            operation,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        debug!(backend = local.name(), %operation, "using local file");
        let value = attempt(&local)?;
        if operation == Operation::Save && !warnings.is_empty() {
            self.mark_unsynced(&warnings);
        }
        Ok(Outcome { value, warnings })
    }

    fn mark_unsynced(&self, warnings: &[StoreWarning]) {
        let path = self.unsynced_path();
        let reasons: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        if let Err(e) = fs::write(&path, reasons.join("\n") + "\n") {
            warn!(path = %path.display(), error = %e, "cannot write unsynced marker");
        }
    }

    fn clear_unsynced(&self) {
        let path = self.unsynced_path();
        if !path.exists() {
            return;
        }
        match fs::remove_file(&path) {
            Ok(()) => info!("remote spreadsheet caught up with the local data file"),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot remove unsynced marker"),
        }
    }
}

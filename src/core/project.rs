//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::storage::{LocalFile, StoreError};

/// Name of the directory marking a project root
pub const CONFIG_DIR: &str = ".roomcat";

/// A room catalog project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .roomcat/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(CONFIG_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    ///
    /// Writes a commented default config and the empty data file.
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        std::fs::create_dir_all(path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let config_dir = root.join(CONFIG_DIR);
        if config_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&config_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        let config_path = Config::project_config_path(&root);
        if force || !config_path.exists() {
            std::fs::write(&config_path, Self::default_config())
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        let project = Self { root };
        let config = Config::load_for(&project.root);
        LocalFile::new(config.data_path(&project.root)).ensure_exists()?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# Room catalog project configuration

# Local data file, relative to the project root
# data_file: listings.csv

# Seconds a loaded catalog is reused before re-reading (0 disables)
# cache_ttl_secs: 600

# Worksheet holding the catalog in the remote spreadsheet
# worksheet: data

# Remote spreadsheet; used in preference to the local file when configured
# remote:
#   credentials: service_account.json
#   sheet_id: ""
#   sheet_url: ""
#   timeout_secs: 30
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .roomcat configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a room catalog project (searched from {searched_from:?}). Run 'roomcat init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("room catalog project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Column;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();

        assert!(project.config_dir().is_dir());
        assert!(project.config_dir().join("config.yaml").exists());

        let data = std::fs::read_to_string(project.root().join("listings.csv")).unwrap();
        assert!(data.starts_with(&Column::headers().join(",")));
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let err = Project::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_project_init_keeps_existing_data() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("listings.csv"), "ID,Quận\n1,Q1\n").unwrap();
        Project::init(tmp.path(), false).unwrap();

        let data = std::fs::read_to_string(tmp.path().join("listings.csv")).unwrap();
        assert_eq!(data, "ID,Quận\n1,Q1\n");
    }

    #[test]
    fn test_project_discover_finds_config_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_config_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}

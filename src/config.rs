//! Connection configuration
//!
//! A connection needs exactly one data source:
//! - a single in-memory table (registered as `dataframe`)
//! - a single backing file (table named by the file stem)
//! - a directory whose files are discovered lazily by name
//! - a mapping of named in-memory tables
//!
//! Options are plain serde structs and can be loaded from JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, CsvStore, MemoryStore, TableStore};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::table::Table;

/// Name given to a single in-memory table source
pub const DEFAULT_TABLE_NAME: &str = "dataframe";

/// Persistence strategy, chosen once at construction.
///
/// Statements always run over in-memory tables; the backend decides where
/// commit writes them and where rollback reads them back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// One `<table>.<ext>` file per table
    #[default]
    Csv,
    /// Snapshots held in memory, nothing touches the filesystem
    Memory,
}

impl Backend {
    /// Builds the table store for this backend
    pub fn store(&self, base_dir: impl Into<PathBuf>, extension: &str) -> Box<dyn TableStore> {
        match self {
            Backend::Csv => Box::new(CsvStore::new(base_dir, extension)),
            Backend::Memory => Box::new(MemoryStore::new()),
        }
    }
}

/// Connection options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Default batch size for `fetchmany` (optional, default 1)
    #[serde(default = "default_arraysize")]
    pub arraysize: usize,

    /// Backing file extension without the dot (optional, default "csv")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    #[serde(default)]
    pub backend: Backend,
}

fn default_arraysize() -> usize {
    1
}

fn default_file_extension() -> String {
    "csv".to_string()
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            arraysize: default_arraysize(),
            file_extension: default_file_extension(),
            backend: Backend::default(),
        }
    }
}

impl ConnectionOptions {
    /// Load options from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let options: ConnectionOptions = serde_json::from_str(&content)
            .map_err(|e| Error::Interface(format!("Invalid options JSON: {}", e)))?;

        options.validate()?;

        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.arraysize == 0 {
            return Err(Error::Interface("arraysize must be > 0".into()));
        }
        if self.file_extension.is_empty()
            || self
                .file_extension
                .contains(|c: char| c == '.' || c == '/' || c == '\\')
        {
            return Err(Error::Interface(format!(
                "Invalid file_extension: '{}'",
                self.file_extension
            )));
        }
        Ok(())
    }
}

/// Where a connection's tables come from
#[derive(Debug, Clone)]
pub enum ConnectionSource {
    Table(Table),
    File(PathBuf),
    Directory(PathBuf),
    Tables(BTreeMap<String, Table>),
}

/// Builds a `Connection` from one source plus options
#[derive(Default)]
pub struct ConnectionBuilder {
    sources: Vec<ConnectionSource>,
    options: ConnectionOptions,
    store: Option<Box<dyn TableStore>>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: ConnectionSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn table(self, table: Table) -> Self {
        self.source(ConnectionSource::Table(table))
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.source(ConnectionSource::File(path.into()))
    }

    pub fn directory(self, path: impl Into<PathBuf>) -> Self {
        self.source(ConnectionSource::Directory(path.into()))
    }

    pub fn tables(self, tables: BTreeMap<String, Table>) -> Self {
        self.source(ConnectionSource::Tables(tables))
    }

    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Persists in-memory sources to `store` instead of the current directory
    pub fn store(mut self, store: Box<dyn TableStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the configuration and opens the connection
    pub fn connect(mut self) -> Result<Connection> {
        self.options.validate()?;

        let source = match self.sources.len() {
            1 => self.sources.remove(0),
            0 => {
                return Err(Error::Interface(
                    "No data source given: expected a table, a file, a directory or a table mapping"
                        .into(),
                ))
            }
            n => {
                return Err(Error::Interface(format!(
                    "Expected exactly one data source, got {}",
                    n
                )))
            }
        };

        let backend = self.options.backend;
        let extension = self.options.file_extension.clone();
        let memory_store = |store: Option<Box<dyn TableStore>>| -> Box<dyn TableStore> {
            store.unwrap_or_else(|| backend.store(".", &extension))
        };
        let file_backend = |path: &Path| -> Result<()> {
            match backend {
                Backend::Csv => Ok(()),
                Backend::Memory => Err(Error::Interface(format!(
                    "The memory backend cannot open {}",
                    path.display()
                ))),
            }
        };

        let catalog = match source {
            ConnectionSource::Table(table) => {
                let mut catalog = Catalog::new(memory_store(self.store));
                catalog.register(DEFAULT_TABLE_NAME, table, None)?;
                catalog
            }
            ConnectionSource::Tables(tables) => {
                let mut catalog = Catalog::new(memory_store(self.store));
                for (name, table) in tables {
                    catalog.register(&name, table, None)?;
                }
                catalog
            }
            ConnectionSource::File(path) => {
                file_backend(path.as_path())?;
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| {
                        Error::Interface(format!("Invalid table file path: {}", path.display()))
                    })?
                    .to_string();
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| {
                        Error::Interface(format!(
                            "Table file needs an extension: {}",
                            path.display()
                        ))
                    })?
                    .to_string();
                let base = match path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                    _ => PathBuf::from("."),
                };

                let mut catalog = Catalog::new(Box::new(CsvStore::new(base, ext)));
                catalog.load(&name)?;
                catalog
            }
            ConnectionSource::Directory(dir) => {
                file_backend(dir.as_path())?;
                if !dir.is_dir() {
                    return Err(Error::Interface(format!(
                        "Not a directory: {}",
                        dir.display()
                    )));
                }
                Catalog::new(backend.store(dir, &extension)).with_discovery(true)
            }
        };

        debug!(tables = catalog.len(), backend = ?self.options.backend, "connection opened");
        Ok(Connection::new(catalog, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::table::Value;
    use tempfile::TempDir;

    fn small() -> Table {
        Table::from_rows(&["a"], vec![vec![Value::Int(1)]]).unwrap()
    }

    #[test]
    fn test_options_defaults_from_json() {
        let options: ConnectionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ConnectionOptions::default());
        assert_eq!(options.arraysize, 1);
        assert_eq!(options.file_extension, "csv");
        assert_eq!(options.backend, Backend::Csv);

        let options: ConnectionOptions =
            serde_json::from_str(r#"{"arraysize": 10, "backend": "memory"}"#).unwrap();
        assert_eq!(options.arraysize, 10);
        assert_eq!(options.backend, Backend::Memory);
    }

    #[test]
    fn test_options_validation() {
        let options = ConnectionOptions {
            arraysize: 0,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::Interface(_))));
    }

    #[test]
    fn test_load_options_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.json");
        fs::write(&path, r#"{"file_extension": "tsv"}"#).unwrap();
        let options = ConnectionOptions::load(&path).unwrap();
        assert_eq!(options.file_extension, "tsv");
    }

    #[test]
    fn test_requires_exactly_one_source() {
        let err = ConnectionBuilder::new().connect().err().unwrap();
        assert!(matches!(err, Error::Interface(_)));

        let err = ConnectionBuilder::new()
            .table(small())
            .directory(".")
            .connect()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Interface(_)));
    }

    #[test]
    fn test_single_table_is_named_dataframe() {
        let conn = ConnectionBuilder::new()
            .table(small())
            .store(Box::new(MemoryStore::new()))
            .connect()
            .unwrap();
        assert_eq!(conn.table_names().unwrap(), vec![DEFAULT_TABLE_NAME]);
    }

    #[test]
    fn test_file_source_loads_stem() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fruits.csv");
        fs::write(&path, "id,name\n1,Apple\n").unwrap();
        let conn = ConnectionBuilder::new().file(&path).connect().unwrap();
        assert_eq!(conn.table_names().unwrap(), vec!["fruits"]);
    }

    #[test]
    fn test_extensionless_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fruits");
        fs::write(&path, "id,name\n1,Apple\n").unwrap();
        let err = ConnectionBuilder::new().file(&path).connect().err().unwrap();
        assert!(matches!(err, Error::Interface(_)));
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn test_memory_backend_keeps_snapshots_off_disk() {
        let temp = TempDir::new().unwrap();
        let options = ConnectionOptions {
            backend: Backend::Memory,
            ..Default::default()
        };
        let conn = ConnectionBuilder::new()
            .table(small())
            .options(options.clone())
            .connect()
            .unwrap();
        conn.commit().unwrap();
        conn.rollback().unwrap();
        assert_eq!(conn.table_names().unwrap(), vec![DEFAULT_TABLE_NAME]);
        assert!(!Path::new("dataframe.csv").exists());

        let err = ConnectionBuilder::new()
            .directory(temp.path())
            .options(options)
            .connect()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Interface(_)));
    }

    #[test]
    fn test_missing_directory() {
        let err = ConnectionBuilder::new()
            .directory("/definitely/not/here")
            .connect()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Interface(_)));
    }
}

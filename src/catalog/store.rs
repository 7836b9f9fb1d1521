//! Table persistence strategies
//!
//! A `TableStore` moves `RawTable` snapshots in and out of durable storage.
//! `CsvStore` keeps one `<name>.<ext>` file per table under a base directory.
//! `MemoryStore` keeps snapshots in memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::RawTable;

/// Persistence backend for committed table snapshots
pub trait TableStore {
    /// Loads the committed snapshot of a table
    fn load(&self, name: &str) -> Result<RawTable>;

    /// Replaces the committed snapshot of a table
    fn save(&mut self, name: &str, table: &RawTable) -> Result<()>;

    /// Removes the snapshot if present; returns whether one existed
    fn remove(&mut self, name: &str) -> Result<bool>;

    fn exists(&self, name: &str) -> bool;

    /// Human-readable location of the table's snapshot
    fn location(&self, name: &str) -> String;

    /// Names of every stored table, sorted
    fn list(&self) -> Result<Vec<String>>;
}

/// One CSV file per table under a base directory
#[derive(Debug, Clone)]
pub struct CsvStore {
    base_dir: PathBuf,
    extension: String,
}

impl CsvStore {
    pub fn new(base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the backing file path for a table
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", name, self.extension))
    }

    fn read_error(path: &Path, e: csv::Error) -> Error {
        match e.kind() {
            csv::ErrorKind::Io(_) => Error::csv(path, e),
            _ => Error::Parse(format!("Malformed table file {}: {}", path.display(), e)),
        }
    }
}

impl TableStore for CsvStore {
    fn load(&self, name: &str) -> Result<RawTable> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::NotFound(format!("File does not exist: {}", path.display())));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(|e| Self::read_error(&path, e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| Self::read_error(&path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(Error::Data(format!("{}: empty file", path.display())));
        }

        let mut raw = RawTable::new(header);
        for record in reader.records() {
            let record = record.map_err(|e| Self::read_error(&path, e))?;
            raw.rows.push(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }
        Ok(raw)
    }

    fn save(&mut self, name: &str, table: &RawTable) -> Result<()> {
        fs::create_dir_all(&self.base_dir).map_err(|e| Error::io(&self.base_dir, e))?;

        let path = self.path_for(name);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| Error::csv(&path, e))?;
        writer
            .write_record(&table.header)
            .map_err(|e| Error::csv(&path, e))?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
                .map_err(|e| Error::csv(&path, e))?;
        }
        writer.flush().map_err(|e| Error::io(&path, e))?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        Ok(true)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    fn location(&self, name: &str) -> String {
        self.path_for(name).display().to_string()
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.base_dir).map_err(|e| Error::io(&self.base_dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&self.base_dir, e))?.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(&self.extension))
                .unwrap_or(false);
            if !(path.is_file() && matches_ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Snapshot store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: BTreeMap<String, RawTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryStore {
    fn load(&self, name: &str) -> Result<RawTable> {
        self.snapshots
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No committed snapshot for table {}", name)))
    }

    fn save(&mut self, name: &str, table: &RawTable) -> Result<()> {
        self.snapshots.insert(name.to_string(), table.clone());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        Ok(self.snapshots.remove(name).is_some())
    }

    fn exists(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    fn location(&self, name: &str) -> String {
        format!("memory:{}", name)
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.snapshots.keys().cloned().collect())
    }
}

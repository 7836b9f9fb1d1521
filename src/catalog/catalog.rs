//! Named typed tables with commit/rollback against a table store

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::schema::{convert, infer_schema, Schema};
use crate::table::Table;

use super::store::TableStore;

fn name_pattern() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"))
        .as_ref()
        .map_err(|e| Error::InvalidName(e.to_string()))
}

/// Checks that a table name is a plain identifier
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern()?.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Registry of named tables and their schemas.
///
/// Table names are unique. With discovery enabled, tables present in the
/// store but not yet in memory are loaded on first use.
pub struct Catalog {
    tables: BTreeMap<String, Table>,
    schemas: BTreeMap<String, Schema>,
    store: Box<dyn TableStore>,
    discover: bool,
}

impl Catalog {
    pub fn new(store: Box<dyn TableStore>) -> Self {
        Self {
            tables: BTreeMap::new(),
            schemas: BTreeMap::new(),
            store,
            discover: false,
        }
    }

    /// Enables lazy loading of stored tables on first reference
    pub fn with_discovery(mut self, discover: bool) -> Self {
        self.discover = discover;
        self
    }

    /// Returns true if the table is in memory or discoverable in the store
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name) || (self.discover && self.store.exists(name))
    }

    /// Creates an empty table from a schema
    pub fn create(&mut self, name: &str, schema: Schema) -> Result<()> {
        validate_name(name)?;
        if self.contains(name) {
            return Err(Error::DuplicateTable(name.to_string()));
        }
        let columns = schema.resolve()?;
        let canonical = Schema::of_columns(&columns);

        self.tables.insert(name.to_string(), Table::new(columns));
        self.schemas.insert(name.to_string(), canonical);
        info!(table = %name, columns = schema.len(), "created table");
        Ok(())
    }

    /// Attaches an externally supplied table, coercing it to `schema` if given
    pub fn register(&mut self, name: &str, table: Table, schema: Option<&Schema>) -> Result<()> {
        validate_name(name)?;
        if self.contains(name) {
            return Err(Error::DuplicateTable(name.to_string()));
        }
        let table = match schema {
            Some(schema) => convert(table, schema)?,
            None => table,
        };

        info!(table = %name, rows = table.row_count(), "registered table");
        self.schemas
            .insert(name.to_string(), Schema::of_columns(table.columns()));
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Removes a table and its stored snapshot
    pub fn drop(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(Error::NotFound(format!("Table {} does not exist", name)));
        }
        self.tables.remove(name);
        self.schemas.remove(name);
        if self.store.remove(name)? {
            debug!(location = %self.store.location(name), "removed backing file");
        }
        info!(table = %name, "dropped table");
        Ok(())
    }

    /// Loads a table from the store, inferring column types
    pub fn load(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        let raw = self.store.load(name)?;
        let table = raw.into_table();
        let schema = infer_schema(&table);
        let table = convert(table, &schema)?;

        info!(
            table = %name,
            rows = table.row_count(),
            location = %self.store.location(name),
            "loaded table"
        );
        self.schemas.insert(name.to_string(), schema);
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Makes sure a referenced table is in memory
    pub fn ensure_loaded(&mut self, name: &str) -> Result<()> {
        if self.tables.contains_key(name) {
            return Ok(());
        }
        if self.discover && self.store.exists(name) {
            return self.load(name);
        }
        Err(Error::NotFound(format!("Table {} does not exist", name)))
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Table {} does not exist", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Table {} does not exist", name)))
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Names of loaded tables plus, with discovery, stored ones
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        if self.discover {
            names.extend(self.store.list()?);
            names.sort();
            names.dedup();
        }
        Ok(names)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Writes every in-memory table to the store.
    ///
    /// Tables are saved one at a time; a failure leaves earlier tables
    /// persisted.
    pub fn commit(&mut self) -> Result<()> {
        let mut saved = 0;
        for (name, table) in &self.tables {
            if let Err(e) = self.store.save(name, &table.to_raw()) {
                warn!(table = %name, saved, error = %e, "commit failed part way");
                return Err(e);
            }
            saved += 1;
        }
        info!(tables = saved, "committed");
        Ok(())
    }

    /// Reloads every in-memory table from its last committed snapshot.
    ///
    /// A failure leaves earlier tables restored.
    pub fn rollback(&mut self) -> Result<()> {
        let names: Vec<String> = self.tables.keys().cloned().collect();
        for (restored, name) in names.iter().enumerate() {
            if let Err(e) = self.restore(name) {
                warn!(table = %name, restored, error = %e, "rollback failed part way");
                return Err(e);
            }
        }
        info!(tables = names.len(), "rolled back");
        Ok(())
    }

    fn restore(&mut self, name: &str) -> Result<()> {
        let raw = self.store.load(name)?;
        let schema = match (self.schemas.get(name), self.tables.get(name)) {
            (Some(schema), _) => schema.clone(),
            (None, Some(table)) => Schema::of_columns(table.columns()),
            (None, None) => Schema::new(),
        };
        let table = convert(raw.into_table(), &schema)?;
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Drops every table from memory; stored snapshots are untouched
    pub fn close(&mut self) {
        debug!(tables = self.tables.len(), "closing catalog");
        self.tables.clear();
        self.schemas.clear();
    }
}

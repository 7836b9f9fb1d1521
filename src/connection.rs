//! Connections own the catalog and hand out cursors

use std::cell::{Cell, RefCell};
use std::path::Path;

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::{ConnectionBuilder, ConnectionOptions};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::executor::{ExecutionOutcome, QueryExecutor};
use crate::parser::parse;
use crate::schema::Schema;
use crate::table::Table;

/// A connection to one catalog.
///
/// Cursors borrow the connection; every cursor sees mutations made through
/// any other cursor immediately.
pub struct Connection {
    catalog: RefCell<Catalog>,
    options: ConnectionOptions,
    closed: Cell<bool>,
}

impl Connection {
    pub(crate) fn new(catalog: Catalog, options: ConnectionOptions) -> Self {
        Self {
            catalog: RefCell::new(catalog),
            options,
            closed: Cell::new(false),
        }
    }

    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Opens a directory of table files with default options
    pub fn open_dir(path: impl AsRef<Path>) -> Result<Self> {
        ConnectionBuilder::new()
            .directory(path.as_ref())
            .connect()
    }

    /// Opens a single table file with default options
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        ConnectionBuilder::new().file(path.as_ref()).connect()
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Returns a new cursor
    pub fn cursor(&self) -> Result<Cursor<'_>> {
        self.check_open()?;
        Ok(Cursor::new(self))
    }

    /// Persists every table
    pub fn commit(&self) -> Result<()> {
        self.check_open()?;
        self.catalog.borrow_mut().commit()
    }

    /// Restores every table to its last committed state
    pub fn rollback(&self) -> Result<()> {
        self.check_open()?;
        self.catalog.borrow_mut().rollback()
    }

    /// Drops all in-memory tables; later calls fail
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.catalog.borrow_mut().close();
        debug!("connection closed");
    }

    pub fn create_table(&self, name: &str, schema: Schema) -> Result<()> {
        self.check_open()?;
        self.catalog.borrow_mut().create(name, schema)
    }

    pub fn register_table(&self, name: &str, table: Table, schema: Option<&Schema>) -> Result<()> {
        self.check_open()?;
        self.catalog.borrow_mut().register(name, table, schema)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.check_open()?;
        self.catalog.borrow().table_names()
    }

    pub fn schema(&self, name: &str) -> Option<Schema> {
        self.catalog.borrow().schema(name).cloned()
    }

    /// Parses and executes bound SQL text
    pub(crate) fn run(&self, sql: &str) -> Result<ExecutionOutcome> {
        self.check_open()?;
        let statement = parse(sql)?;
        let mut catalog = self.catalog.borrow_mut();
        QueryExecutor::new(&mut catalog).execute(&statement)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.closed.get() {
            Err(Error::Interface("Connection is closed".into()))
        } else {
            Ok(())
        }
    }
}

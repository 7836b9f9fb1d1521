//! Table catalog subsystem for tabula
//!
//! The catalog owns every named table and its schema. Persistence goes
//! through a `TableStore`:
//!
//! - `commit()` snapshots every table to the store
//! - `rollback()` reloads every table from its last snapshot
//! - `drop()` removes the table and its snapshot
//!
//! Commit and rollback are not atomic across tables. A failure part way
//! leaves earlier tables written (or restored).

mod catalog;
mod store;

pub use catalog::{validate_name, Catalog};
pub use store::{CsvStore, MemoryStore, TableStore};

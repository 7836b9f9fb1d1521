//! tabula - an embeddable SQL engine over file-backed tables
//!
//! Statements run against in-memory typed tables. Each table is persisted
//! as one CSV file; `commit` writes every table out and `rollback` reloads
//! the last committed state.
//!
//! ```no_run
//! use tabula::{params, Connection};
//!
//! # fn main() -> tabula::Result<()> {
//! let conn = Connection::open_dir("data")?;
//! let mut cursor = conn.cursor()?;
//! cursor.execute("SELECT name, age FROM users WHERE age > ?", params![25])?;
//! for row in cursor.fetchall()? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod table;

pub use config::{Backend, ConnectionBuilder, ConnectionOptions, ConnectionSource};
pub use connection::Connection;
pub use cursor::{ColumnDescription, Cursor, Rows};
pub use error::{Error, ErrorCategory, Result};
pub use parser::{Param, Params};
pub use schema::{DataType, Schema};
pub use table::{Column, Row, Table, Value};

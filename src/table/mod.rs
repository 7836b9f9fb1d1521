//! Tabular data model
//!
//! - `Value`: typed cell (Null, Int, Float, Bool, Date, Text)
//! - `Table`: ordered columns with declared types plus ordered rows
//! - `RawTable`: untyped header + text cells, used only by the file codec

mod raw;
mod table;
mod value;

pub use raw::RawTable;
pub use table::{Column, Row, Table};
pub use value::{Value, ValueKey};

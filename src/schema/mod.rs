//! Schemas and type coercion
//!
//! A schema maps column names to declared types. Tables are typed from
//! creation onward; coercion runs only when untyped data enters the catalog
//! (registration, lazy load, rollback) and when literals are written.

mod coerce;
mod types;

pub use coerce::{coerce_value, convert, infer_schema, parse_date};
pub use types::{ColumnDef, DataType, Schema};

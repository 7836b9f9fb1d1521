//! Statement parser subsystem
//!
//! Raw SQL goes through three steps before execution:
//!
//! 1. Parameter binding: placeholders are replaced with rendered literals
//! 2. Tokenization: the `sqlparser` tokenizer splits the text into tokens
//! 3. Parsing: a recursive-descent parser builds a `Statement`
//!
//! # Grammar restrictions
//!
//! - WHERE holds exactly one `column op literal` comparison
//! - At most one inner equality JOIN
//! - Aggregates: COUNT, SUM, AVG, MAX, MIN

mod ast;
mod params;
mod parser;

pub use ast::{
    AggregateArg, AggregateCall, AggregateFunction, Assignment, ColumnRef, ColumnSpec, CompareOp,
    Comparison, CreateTableStatement, DeleteStatement, DropTableStatement, InsertStatement,
    JoinClause, Literal, OrderByItem, SelectItem, SelectStatement, SortDirection, Statement,
    UpdateStatement,
};
pub use params::{bind, Param, Params};
pub use parser::{parse, tokenize, Parser};

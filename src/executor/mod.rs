//! Query Executor subsystem for tabula
//!
//! The executor runs parsed statements against the catalog. SELECT produces
//! a result table that owns its rows; mutations change catalog tables in
//! place and report affected rows.
//!
//! # Evaluators
//!
//! - `PredicateFilter`: single-comparison WHERE masks
//! - `HashJoin`: inner equi-join
//! - `Aggregator`: GROUP BY and COUNT / SUM / AVG / MAX / MIN
//! - `Projector`: select-list projection and aliasing
//! - `ResultSorter`: stable multi-key ORDER BY

mod aggregate;
mod executor;
mod filters;
mod join;
mod projection;
mod result;
mod sorter;

pub use aggregate::{Aggregator, Grouped};
pub use executor::QueryExecutor;
pub use filters::PredicateFilter;
pub use join::{HashJoin, JoinInput};
pub use projection::{Projection, Projector};
pub use result::ExecutionOutcome;
pub use sorter::ResultSorter;

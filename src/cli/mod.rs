//! Command line interface for tabula
//!
//! Output is JSON lines on stdout; errors go to stderr.

mod args;
mod commands;
mod io;

pub use args::{Cli, Command};
pub use commands::{query, run_command, tables, QueryRequest};
pub use io::{write_names, write_rowcount, write_rows};

use crate::error::Result;

/// Parse arguments and run the selected command
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

//! CLI argument definitions using clap
//!
//! Commands:
//! - tabula query --dir <path> --sql <statement> [--params <json>] [--commit]
//! - tabula tables --dir <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tabula - SQL over a directory of CSV tables
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a single statement and print the result rows
    Query {
        /// Directory holding the table files
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Statement text, with `?` or `:name` placeholders
        #[arg(long)]
        sql: String,

        /// Bind values as a JSON array (positional) or object (named)
        #[arg(long)]
        params: Option<String>,

        /// Connection options file (JSON)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Persist every table after the statement succeeds
        #[arg(long)]
        commit: bool,
    },

    /// List the tables discoverable in a directory
    Tables {
        /// Directory holding the table files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! CLI command implementations
//!
//! Each command opens a directory-backed connection, does its work and
//! drops the connection. Nothing is persisted unless `--commit` is given.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::args::Command;
use super::io::{write_names, write_rowcount, write_rows};
use crate::config::{ConnectionBuilder, ConnectionOptions};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::parser::Params;

/// Run a CLI command
pub fn run_command(command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Query {
            dir,
            sql,
            params,
            options,
            commit,
        } => query(
            &QueryRequest {
                dir,
                sql,
                params,
                options,
                commit,
            },
            &mut out,
        ),
        Command::Tables { dir } => tables(&dir, &mut out),
    }
}

/// Arguments of the `query` command
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub dir: PathBuf,
    pub sql: String,
    pub params: Option<String>,
    pub options: Option<PathBuf>,
    pub commit: bool,
}

/// Execute one statement and write its result
pub fn query<W: Write>(request: &QueryRequest, out: &mut W) -> Result<()> {
    // Step 1: Decode bind values
    let params = match &request.params {
        Some(text) => parse_params(text)?,
        None => Params::None,
    };

    // Step 2: Open the directory
    let conn = open(&request.dir, request.options.as_deref())?;

    // Step 3: Execute
    {
        let mut cursor = conn.cursor()?;
        cursor.execute(&request.sql, params)?;

        match cursor.description() {
            Some(description) => {
                let columns: Vec<String> = description.into_iter().map(|d| d.name).collect();
                let rows = cursor.fetchall()?;
                write_rows(out, &columns, &rows)?;
            }
            None => write_rowcount(out, cursor.rowcount())?,
        }
    }

    // Step 4: Persist on request
    if request.commit {
        conn.commit()?;
        info!(dir = %request.dir.display(), "committed");
    }

    conn.close();
    Ok(())
}

/// List the tables in a directory
pub fn tables<W: Write>(dir: &Path, out: &mut W) -> Result<()> {
    let conn = open(dir, None)?;
    let names = conn.table_names()?;
    conn.close();
    write_names(out, &names)
}

fn open(dir: &Path, options: Option<&Path>) -> Result<Connection> {
    let options = match options {
        Some(path) => ConnectionOptions::load(path)?,
        None => ConnectionOptions::default(),
    };
    ConnectionBuilder::new()
        .directory(dir)
        .options(options)
        .connect()
}

fn parse_params(text: &str) -> Result<Params> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::Interface(format!("Invalid --params JSON: {}", e)))?;
    Params::try_from(json)
}

//! Error types for tabula
//!
//! Every failure carries a structured kind internally. Each kind belongs to
//! one DB-API category (`ErrorCategory`). `Cursor::execute` wraps failures
//! in `Error::Database`, so callers see a single surfaced form but can
//! still recover the structured kind through `Error::root`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for tabula operations
pub type Result<T> = std::result::Result<T, Error>;

/// DB-API error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad construction arguments, use after close
    Interface,
    /// Malformed SQL, bad identifiers, parameter mismatches
    Programming,
    /// Coercion failures, unsupported parameter types
    Data,
    /// File I/O failures
    Operational,
    /// Duplicate table names
    Integrity,
    /// Clauses or operators outside the supported grammar
    NotSupported,
    /// Catch-all surfaced by execute()
    Database,
}

impl ErrorCategory {
    /// Returns the DB-API class name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Interface => "InterfaceError",
            ErrorCategory::Programming => "ProgrammingError",
            ErrorCategory::Data => "DataError",
            ErrorCategory::Operational => "OperationalError",
            ErrorCategory::Integrity => "IntegrityError",
            ErrorCategory::NotSupported => "NotSupportedError",
            ErrorCategory::Database => "DatabaseError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// tabula errors
#[derive(Debug, Error)]
pub enum Error {
    // ==================
    // Statement errors
    // ==================
    /// Malformed statement text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Placeholder/parameter mismatch
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Non-aggregated column outside GROUP BY
    #[error("Grouping error: {0}")]
    Grouping(String),

    /// Clause or operator outside the supported grammar
    #[error("Not supported: {0}")]
    NotSupported(String),

    // ==================
    // Catalog errors
    // ==================
    /// Table or column not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Table already registered
    #[error("Table {0} already exists")]
    DuplicateTable(String),

    /// Invalid table name
    #[error("Invalid table name: {0:?}")]
    InvalidName(String),

    /// Unrecognized declared type or schema/table mismatch
    #[error("Schema error: {0}")]
    Schema(String),

    /// Value could not be represented
    #[error("Data error: {0}")]
    Data(String),

    // ==================
    // Persistence errors
    // ==================
    /// File system failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flat-file codec failure
    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ==================
    // Interface errors
    // ==================
    /// Construction or lifecycle misuse
    #[error("Interface error: {0}")]
    Interface(String),

    /// Surfaced form of any failure inside execute()
    #[error("Query execution failed: {0}")]
    Database(Box<Error>),
}

impl Error {
    /// Wraps an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a codec error with the path it occurred on
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }

    /// Wraps into the surfaced `Database` form (idempotent)
    pub fn into_database(self) -> Self {
        match self {
            Error::Database(_) => self,
            other => Error::Database(Box::new(other)),
        }
    }

    /// Returns the DB-API category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Parse(_)
            | Error::Parameter(_)
            | Error::Grouping(_)
            | Error::NotFound(_)
            | Error::InvalidName(_) => ErrorCategory::Programming,
            Error::Schema(_) | Error::Data(_) => ErrorCategory::Data,
            Error::Io { .. } | Error::Csv { .. } => ErrorCategory::Operational,
            Error::DuplicateTable(_) => ErrorCategory::Integrity,
            Error::NotSupported(_) => ErrorCategory::NotSupported,
            Error::Interface(_) => ErrorCategory::Interface,
            Error::Database(_) => ErrorCategory::Database,
        }
    }

    /// Returns the innermost structured error
    pub fn root(&self) -> &Error {
        match self {
            Error::Database(inner) => inner.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::Parse("x".into()).category(),
            ErrorCategory::Programming
        );
        assert_eq!(
            Error::DuplicateTable("t".into()).category(),
            ErrorCategory::Integrity
        );
        assert_eq!(Error::Schema("x".into()).category(), ErrorCategory::Data);
        assert_eq!(
            Error::NotSupported("AND".into()).category(),
            ErrorCategory::NotSupported
        );
        let io = Error::io(
            "/tmp/x.csv",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(io.category(), ErrorCategory::Operational);
    }

    #[test]
    fn test_database_wrapper_keeps_root() {
        let err = Error::NotFound("Table users".into()).into_database();
        assert_eq!(err.category(), ErrorCategory::Database);
        assert!(matches!(err.root(), Error::NotFound(_)));
        assert!(err.to_string().contains("Table users"));

        // wrapping twice does not nest
        let again = err.into_database();
        assert!(matches!(again.root(), Error::NotFound(_)));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::Interface.as_str(), "InterfaceError");
        assert_eq!(ErrorCategory::NotSupported.to_string(), "NotSupportedError");
    }
}

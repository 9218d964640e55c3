//! Error types for the data-loader crate.
//!
//! Every variant that comes from reading a source table carries the path
//! of the offending file, so the offline run can report exactly which
//! input was unusable.

use thiserror::Error;

/// Errors that can occur while loading and joining the metadata tables
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading a file
    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file (bad quoting, ragged rows, ...)
    #[error("CSV error in {path}: {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A column needed downstream (or the join key) is not in the header
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A row couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

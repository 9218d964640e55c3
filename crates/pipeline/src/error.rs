//! Error types for the offline pipeline.

use data_loader::DataLoadError;
use std::fmt;
use thiserror::Error;

/// The structured (JSON-encoded) columns a tag bag is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructuredField {
    Genres,
    Keywords,
    Cast,
    Crew,
}

impl fmt::Display for StructuredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StructuredField::Genres => "genres",
            StructuredField::Keywords => "keywords",
            StructuredField::Cast => "cast",
            StructuredField::Crew => "crew",
        };
        f.write_str(name)
    }
}

/// Decoding failure for one structured field of one movie.
///
/// Distinct from an empty list: `Ok(vec![])` means "the movie has no cast",
/// `Err(MalformedField)` means "the cast column could not be read".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Malformed {field} field: {reason}")]
    MalformedField {
        field: StructuredField,
        reason: String,
    },
}

/// Errors that abort an offline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input tables could not be read or joined
    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Nothing survived loading, so there is nothing to index
    #[error("No movies left after loading and joining the input tables")]
    EmptyCorpus,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

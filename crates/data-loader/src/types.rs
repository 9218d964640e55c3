//! Core domain types shared by the offline pipeline and the serving side.
//!
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (MovieId)
//! - `Option<T>` for columns that may be empty in the source tables
//! - Derive macros for serde so records can be persisted as-is

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// TMDB identifier of a movie; also the key used by the poster API
pub type MovieId = u32;

// =============================================================================
// Source Table Rows
// =============================================================================

/// One row of the movie attributes table, restricted to the columns we use.
///
/// Fields are optional because empty CSV cells are common in this dataset
/// (a handful of movies have no overview, for instance).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieAttributes {
    /// TMDB id; only consulted when a title is ambiguous
    pub id: Option<MovieId>,
    pub title: Option<String>,
    pub overview: Option<String>,
    /// JSON-encoded list of `{"id", "name"}` objects
    pub genres: Option<String>,
    /// JSON-encoded list of `{"id", "name"}` objects
    pub keywords: Option<String>,
}

/// One row of the credits table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieCredits {
    pub movie_id: Option<MovieId>,
    pub title: Option<String>,
    /// JSON-encoded list of cast members, billing order
    pub cast: Option<String>,
    /// JSON-encoded list of crew members with their `job`
    pub crew: Option<String>,
}

// =============================================================================
// Joined Types
// =============================================================================

/// A fully populated row after joining attributes with credits on title.
///
/// Every field is present: rows with any missing field are dropped by the
/// join. The structured fields are still raw JSON strings here; decoding
/// them is the feature extractor's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub overview: String,
    pub genres: String,
    pub keywords: String,
    pub cast: String,
    pub crew: String,
}

/// A movie after feature extraction: the unit the rest of the system works on.
///
/// The position of a record in its table is its row in the similarity
/// matrix, so records are never reordered once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    /// Flat bag of tokens ("tags")
    pub tags: Vec<String>,
}

impl MovieRecord {
    pub fn new(movie_id: MovieId, title: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            movie_id,
            title: title.into(),
            tags,
        }
    }

    /// The tags joined into one space-separated document
    pub fn tag_text(&self) -> String {
        self.tags.join(" ")
    }
}

/// Row counts collected while loading, for logging and sanity checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub movie_rows: usize,
    pub credit_rows: usize,
    /// Rows produced by the join, before dropping incomplete ones
    pub joined_rows: usize,
    /// Joined rows dropped because a required field was missing
    pub dropped_incomplete: usize,
}

impl LoadReport {
    /// Number of rows that survived the join and the completeness check
    pub fn kept(&self) -> usize {
        self.joined_rows - self.dropped_incomplete
    }
}

/// Output of the metadata loader
#[derive(Debug, Clone, Default)]
pub struct JoinedMetadata {
    pub movies: Vec<RawMovie>,
    pub report: LoadReport,
}

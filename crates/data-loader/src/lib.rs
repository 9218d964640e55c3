//! # Data Loader Crate
//!
//! This crate handles loading the TMDB 5000 metadata tables and joining
//! them into one row per movie.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieId, RawMovie, MovieRecord)
//! - **parser**: Parse the CSV files into Rust structs
//! - **join**: Inner join on title and completeness filtering
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::load_movies;
//! use std::path::Path;
//!
//! let joined = load_movies(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//!
//! println!("{} movies ready for feature extraction", joined.movies.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod join;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use join::{join_on_title, load_movies};
pub use types::{
    // Type aliases
    MovieId,
    // Source rows
    MovieAttributes,
    MovieCredits,
    // Joined and extracted rows
    RawMovie,
    MovieRecord,
    JoinedMetadata,
    LoadReport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_record_tag_text() {
        let record = MovieRecord::new(
            19995,
            "Avatar",
            vec!["In".to_string(), "Action".to_string(), "JamesCameron".to_string()],
        );

        assert_eq!(record.tag_text(), "In Action JamesCameron");
    }

    #[test]
    fn test_empty_report() {
        let report = LoadReport::default();
        assert_eq!(report.kept(), 0);
    }
}

//! Error types for the artifact store.

use thiserror::Error;

/// Errors that can occur while saving or loading an artifact bundle
#[derive(Error, Debug)]
pub enum StoreError {
    /// No bundle at the expected location. The serving side turns this
    /// into a "run the preprocessing step first" message.
    #[error("Model artifacts not found in {dir}")]
    ArtifactsMissing { dir: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },

    /// A blob exists but cannot be decoded or fails its integrity checks
    #[error("Corrupt artifact {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Movie index and matrix disagree on the number of rows
    #[error("Artifact bundle is misaligned: {movies} movies but a {matrix}x{matrix} matrix")]
    Misaligned { movies: usize, matrix: usize },
}

pub type Result<T> = std::result::Result<T, StoreError>;

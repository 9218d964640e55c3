//! The artifact bundle: movie index + similarity matrix + manifest.

use crate::error::{Result, StoreError};
use data_loader::MovieRecord;
use pipeline::{PipelineOutput, Precision, SimilarityMatrix};
use serde::{Deserialize, Serialize};

/// Bumped whenever the on-disk layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Describes how a bundle was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    pub movie_count: usize,
    pub vocabulary_size: usize,
    pub max_features: usize,
    pub precision: Precision,
    /// Digest of the encoded matrix; ties the index to the matrix it was
    /// saved with. Filled in by the store on save.
    #[serde(default)]
    pub similarity_digest: u64,
}

/// Everything the serving side needs, loaded or saved as one unit.
///
/// `movies[i]` is row/column `i` of `similarity`; construction fails when
/// the two disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub manifest: BundleManifest,
    pub movies: Vec<MovieRecord>,
    pub similarity: SimilarityMatrix,
}

impl ArtifactBundle {
    pub fn new(
        movies: Vec<MovieRecord>,
        similarity: SimilarityMatrix,
        vocabulary_size: usize,
        max_features: usize,
    ) -> Result<Self> {
        check_alignment(&movies, &similarity)?;
        let manifest = BundleManifest {
            format_version: FORMAT_VERSION,
            movie_count: movies.len(),
            vocabulary_size,
            max_features,
            precision: similarity.precision(),
            similarity_digest: 0,
        };
        Ok(Self {
            manifest,
            movies,
            similarity,
        })
    }

    /// Package the output of an offline run
    pub fn from_pipeline(output: PipelineOutput, max_features: usize) -> Result<Self> {
        let vocabulary_size = output.vocabulary.len();
        Self::new(output.records, output.similarity, vocabulary_size, max_features)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

pub(crate) fn check_alignment(movies: &[MovieRecord], similarity: &SimilarityMatrix) -> Result<()> {
    if movies.len() != similarity.dimension() {
        return Err(StoreError::Misaligned {
            movies: movies.len(),
            matrix: similarity.dimension(),
        });
    }
    Ok(())
}

//! # Offline Pipeline
//!
//! Coordinates the preprocessing job end to end:
//! 1. Load and join the metadata tables
//! 2. Extract a tag bag per movie
//! 3. Fit the vocabulary and vectorize every movie
//! 4. Compute the cosine similarity matrix
//!
//! Persisting the result is left to the artifact store, so this crate has
//! no opinion on file formats.

use std::path::Path;
use std::time::Instant;

use data_loader::{LoadReport, MovieRecord, RawMovie};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::{ExtractionReport, FeatureExtractor};
use crate::similarity::{SimilarityMatrix, cosine_similarity_matrix};
use crate::vectorizer::{CountVectorizer, Vocabulary};

/// Everything an offline run produces.
///
/// `records[i]` is row/column `i` of `similarity`.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<MovieRecord>,
    pub vocabulary: Vocabulary,
    pub similarity: SimilarityMatrix,
    pub load_report: LoadReport,
    pub extraction_report: ExtractionReport,
}

/// Runs the preprocessing stages with a fixed configuration
#[derive(Debug, Clone)]
pub struct OfflinePipeline {
    config: PipelineConfig,
    extractor: FeatureExtractor,
    vectorizer: CountVectorizer,
}

impl OfflinePipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: FeatureExtractor::new(config.top_entries),
            vectorizer: CountVectorizer::new(config.max_features),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Main entry point: load both tables and build the similarity matrix
    pub fn run(&self, movies_path: &Path, credits_path: &Path) -> Result<PipelineOutput> {
        let start_time = Instant::now();

        let joined = data_loader::load_movies(movies_path, credits_path)?;
        info!("Loaded metadata in {:.2?}", start_time.elapsed());

        let mut output = self.run_on(&joined.movies)?;
        output.load_report = joined.report;

        info!(
            "Offline pipeline finished in {:.2?}: {} movies, {} vocabulary columns",
            start_time.elapsed(),
            output.records.len(),
            output.vocabulary.len()
        );
        Ok(output)
    }

    /// Run stages 2-4 on rows that are already joined
    pub fn run_on(&self, movies: &[RawMovie]) -> Result<PipelineOutput> {
        if movies.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let stage = Instant::now();
        let (records, extraction_report) = self.extractor.extract_all(movies);
        info!("Feature extraction took {:.2?}", stage.elapsed());

        let stage = Instant::now();
        let documents: Vec<String> = records.iter().map(MovieRecord::tag_text).collect();
        let (vocabulary, vectors) = self.vectorizer.fit_transform(&documents);
        info!(
            "Vectorized {} movies over {} columns (cap {}) in {:.2?}",
            vectors.len(),
            vocabulary.len(),
            self.vectorizer.max_features(),
            stage.elapsed()
        );

        let stage = Instant::now();
        let similarity = cosine_similarity_matrix(&vectors, self.config.precision);
        info!(
            "Computed {}x{} similarity matrix ({} precision) in {:.2?}",
            similarity.dimension(),
            similarity.dimension(),
            self.config.precision,
            stage.elapsed()
        );

        Ok(PipelineOutput {
            records,
            vocabulary,
            similarity,
            load_report: LoadReport::default(),
            extraction_report,
        })
    }
}

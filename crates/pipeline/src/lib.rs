//! Offline preprocessing: from joined metadata to a similarity matrix.
//!
//! This crate provides:
//! - FeatureExtractor for building a tag bag per movie
//! - CountVectorizer for the capped bag-of-words vocabulary
//! - cosine_similarity_matrix for the pairwise item similarity
//! - OfflinePipeline for running all of the above in order
//!
//! ## Architecture
//! The pipeline processes movies in stages:
//! 1. Tags are extracted from overview text and structured metadata
//! 2. The vectorizer fits a vocabulary and counts tokens per movie
//! 3. The similarity engine compares every pair of count vectors
//!
//! Row order is fixed by the input and never changes between stages.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{OfflinePipeline, PipelineConfig, Precision};
//!
//! let pipeline = OfflinePipeline::new(PipelineConfig {
//!     precision: Precision::Double,
//!     ..PipelineConfig::default()
//! })?;
//! let output = pipeline.run(movies_csv, credits_csv)?;
//! println!("{} movies indexed", output.records.len());
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod offline;
pub mod similarity;
pub mod stop_words;
pub mod vectorizer;

// Re-export main types
pub use config::PipelineConfig;
pub use error::{FeatureError, PipelineError, StructuredField};
pub use features::{ExtractionReport, FeatureExtractor, NamedEntry, TagExtraction};
pub use offline::{OfflinePipeline, PipelineOutput};
pub use similarity::{MatrixData, Precision, SimilarityMatrix, cosine_similarity_matrix};
pub use vectorizer::{CountVector, CountVectorizer, Vocabulary};

//! Feature extraction: from a joined metadata row to a bag of tags.
//!
//! Tags are the overview words followed by the first few genres, keywords
//! and cast members and the director. Multi-word names are collapsed into
//! one token ("Sam Worthington" -> "SamWorthington") so a person or genre
//! stays a single feature after vectorization.

use crate::error::{FeatureError, StructuredField};
use data_loader::{MovieRecord, RawMovie};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How many genres, keywords and cast members contribute tags
pub const DEFAULT_TOP_ENTRIES: usize = 3;

/// Crew job that identifies the director
const DIRECTOR_JOB: &str = "Director";

/// One element of a structured column.
///
/// Only `name` is required; `job` is present on crew entries. Any other
/// keys (`id`, `character`, `credit_id`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

/// Decode a JSON-encoded list of named entries.
pub fn decode_entries(
    field: StructuredField,
    raw: &str,
) -> Result<Vec<NamedEntry>, FeatureError> {
    serde_json::from_str(raw).map_err(|e| FeatureError::MalformedField {
        field,
        reason: e.to_string(),
    })
}

/// Remove internal whitespace so a multi-word name becomes one token
pub fn collapse_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// First `n` names in source order, collapsed
pub fn top_names(entries: &[NamedEntry], n: usize) -> Vec<String> {
    entries
        .iter()
        .take(n)
        .map(|entry| collapse_name(&entry.name))
        .collect()
}

/// Name of the first crew member credited as director, collapsed
pub fn director(crew: &[NamedEntry]) -> Option<String> {
    crew.iter()
        .find(|entry| entry.job.as_deref() == Some(DIRECTOR_JOB))
        .map(|entry| collapse_name(&entry.name))
}

/// Tags for one movie, plus any structured fields that failed to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagExtraction {
    pub tags: Vec<String>,
    pub malformed: Vec<FeatureError>,
}

/// Summary of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub movies: usize,
    /// Malformed structured fields per column
    pub malformed_by_field: BTreeMap<StructuredField, usize>,
}

impl ExtractionReport {
    pub fn malformed_fields(&self) -> usize {
        self.malformed_by_field.values().sum()
    }
}

/// Builds tag bags for joined movies.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    top_entries: usize,
}

impl FeatureExtractor {
    pub fn new(top_entries: usize) -> Self {
        Self { top_entries }
    }

    /// Extract the tag bag of a single movie.
    ///
    /// A malformed structured field contributes no tags and is recorded in
    /// `TagExtraction::malformed`; it never fails the movie.
    pub fn extract(&self, movie: &RawMovie) -> TagExtraction {
        let mut extraction = TagExtraction::default();

        extraction
            .tags
            .extend(movie.overview.split_whitespace().map(str::to_string));

        let lists = [
            (StructuredField::Genres, movie.genres.as_str()),
            (StructuredField::Keywords, movie.keywords.as_str()),
            (StructuredField::Cast, movie.cast.as_str()),
        ];
        for (field, raw) in lists {
            match decode_entries(field, raw) {
                Ok(entries) => extraction.tags.extend(top_names(&entries, self.top_entries)),
                Err(e) => extraction.malformed.push(e),
            }
        }

        match decode_entries(StructuredField::Crew, &movie.crew) {
            Ok(crew) => extraction.tags.extend(director(&crew)),
            Err(e) => extraction.malformed.push(e),
        }

        extraction
    }

    /// Extract tag bags for every movie, keeping input order.
    ///
    /// Order matters: the index of a record here becomes its row in the
    /// similarity matrix.
    pub fn extract_all(&self, movies: &[RawMovie]) -> (Vec<MovieRecord>, ExtractionReport) {
        let extractions: Vec<TagExtraction> =
            movies.par_iter().map(|movie| self.extract(movie)).collect();

        let mut report = ExtractionReport {
            movies: movies.len(),
            ..ExtractionReport::default()
        };
        let mut records = Vec::with_capacity(movies.len());

        for (movie, extraction) in movies.iter().zip(extractions) {
            for FeatureError::MalformedField { field, reason } in &extraction.malformed {
                debug!("'{}' has a malformed {} field: {}", movie.title, field, reason);
                *report.malformed_by_field.entry(*field).or_insert(0) += 1;
            }
            records.push(MovieRecord::new(
                movie.movie_id,
                movie.title.clone(),
                extraction.tags,
            ));
        }

        info!(
            "Extracted tags for {} movies ({} malformed fields)",
            report.movies,
            report.malformed_fields()
        );
        (records, report)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_ENTRIES)
    }
}

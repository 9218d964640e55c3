//! # Recommender
//!
//! Answers "movies like this one" from a loaded artifact bundle:
//! 1. Find the first movie whose title matches exactly
//! 2. Read its similarity row
//! 3. Rank every other movie by score, highest first
//! 4. Return the top 5
//!
//! The bundle is read-only once loaded, so a `Recommender` is cheap to
//! clone and share across tasks.

use std::sync::Arc;
use std::time::Instant;

use artifact_store::{ArtifactBundle, ArtifactStore};
use data_loader::{MovieId, MovieRecord};
use tracing::{debug, info};

use crate::error::Result;

/// Number of recommendations returned per lookup
pub const TOP_K: usize = 5;

/// One recommended movie
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
}

/// Result of looking a title up
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Vec<Recommendation>),
    NotFound { title: String },
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Recommendations in rank order; empty when not found
    pub fn items(&self) -> &[Recommendation] {
        match self {
            Lookup::Found(items) => items,
            Lookup::NotFound { .. } => &[],
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.items().iter().map(|r| r.title.clone()).collect()
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.items().iter().map(|r| r.movie_id).collect()
    }
}

/// Similarity lookups over a shared bundle
#[derive(Clone)]
pub struct Recommender {
    bundle: Arc<ArtifactBundle>,
}

impl Recommender {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    /// Load the bundle from disk once, at startup
    pub fn from_store(store: &ArtifactStore) -> Result<Self> {
        let start = Instant::now();
        let bundle = store.load()?;
        info!(
            "Recommender ready with {} movies in {:.2?}",
            bundle.len(),
            start.elapsed()
        );
        Ok(Self::new(Arc::new(bundle)))
    }

    pub fn len(&self) -> usize {
        self.bundle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }

    /// All titles in index order, for the selection list
    pub fn titles(&self) -> Vec<&str> {
        self.bundle.movies.iter().map(|m| m.title.as_str()).collect()
    }

    /// Titles containing `needle`, ignoring case
    pub fn search(&self, needle: &str) -> Vec<&MovieRecord> {
        let needle = needle.to_lowercase();
        self.bundle
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Recommend movies similar to `title`.
    ///
    /// The title must match byte-for-byte. When several rows share the
    /// title, the first one is used. The queried row is never part of the
    /// result, even if another movie ties with it.
    pub fn recommend(&self, title: &str) -> Lookup {
        let Some(index) = self.bundle.movies.iter().position(|m| m.title == title) else {
            debug!("No movie titled {:?}", title);
            return Lookup::NotFound {
                title: title.to_string(),
            };
        };

        let mut ranked: Vec<(usize, f64)> = self
            .bundle
            .similarity
            .row(index)
            .into_iter()
            .enumerate()
            .filter(|&(other, _)| other != index)
            .collect();

        // Stable: equal scores keep index order
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(TOP_K);

        let items = ranked
            .into_iter()
            .map(|(other, score)| {
                let movie = &self.bundle.movies[other];
                Recommendation {
                    movie_id: movie.movie_id,
                    title: movie.title.clone(),
                    score,
                }
            })
            .collect();
        Lookup::Found(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{CountVectorizer, Precision, cosine_similarity_matrix};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn build_recommender(movies: &[(MovieId, &str, &str)]) -> Recommender {
        let docs: Vec<&str> = movies.iter().map(|(_, _, tags)| *tags).collect();
        let (vocabulary, vectors) = CountVectorizer::new(5000).fit_transform(&docs);
        let records = movies
            .iter()
            .map(|(id, title, tags)| {
                MovieRecord::new(*id, *title, tags.split_whitespace().map(str::to_string).collect())
            })
            .collect();
        let bundle = ArtifactBundle::new(
            records,
            cosine_similarity_matrix(&vectors, Precision::Double),
            vocabulary.len(),
            5000,
        )
        .expect("aligned bundle");
        Recommender::new(Arc::new(bundle))
    }

    fn three_movies() -> Recommender {
        build_recommender(&[
            (1, "A", "alien space marine"),
            (2, "B", "alien space marine"),
            (3, "C", "cowboy horse desert"),
        ])
    }

    // ============================================================================
    // Unit Tests: recommend
    // ============================================================================

    #[test]
    fn test_shared_tags_rank_first() {
        let lookup = three_movies().recommend("A");

        assert_eq!(lookup.titles(), vec!["B", "C"]);
        let items = lookup.items();
        assert_eq!(items[0].score, 1.0);
        assert_eq!(items[1].score, 0.0);
    }

    #[test]
    fn test_never_recommends_itself() {
        let recommender = build_recommender(&[
            (1, "Twin One", "alien ship"),
            (2, "Twin Two", "alien ship"),
            (3, "Blank", "the and of"),
            (4, "Other", "cowboy"),
        ]);

        for title in recommender.titles() {
            let lookup = recommender.recommend(title);
            assert!(lookup.is_found());
            assert!(
                !lookup.titles().iter().any(|t| t == title),
                "{} recommended itself",
                title
            );
        }
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let lookup = three_movies().recommend("Nonexistent Movie XYZ");

        assert_eq!(
            lookup,
            Lookup::NotFound {
                title: "Nonexistent Movie XYZ".to_string()
            }
        );
        assert!(lookup.titles().is_empty());
        assert!(lookup.movie_ids().is_empty());
    }

    #[test]
    fn test_match_is_exact() {
        let recommender = three_movies();

        assert!(!recommender.recommend("a").is_found());
        assert!(!recommender.recommend(" A").is_found());
    }

    #[test]
    fn test_truncates_to_top_k() {
        let movies: Vec<(MovieId, String)> =
            (0..10).map(|i| (i, format!("Movie {}", i))).collect();
        let fixture: Vec<(MovieId, &str, &str)> = movies
            .iter()
            .map(|(id, title)| (*id, title.as_str(), "alien ship"))
            .collect();
        let recommender = build_recommender(&fixture);

        let lookup = recommender.recommend("Movie 3");
        assert_eq!(lookup.items().len(), TOP_K);
        // All scores tie at 1.0, so index order decides
        assert_eq!(lookup.movie_ids(), vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn test_duplicate_titles_use_first_row() {
        let recommender = build_recommender(&[
            (1, "Same", "alien ship"),
            (2, "Same", "cowboy horse"),
            (3, "Alien Film", "alien ship"),
            (4, "Western", "cowboy horse"),
        ]);

        let lookup = recommender.recommend("Same");
        assert_eq!(lookup.movie_ids()[0], 3);
        assert!(!lookup.movie_ids().contains(&1));
    }

    #[test]
    fn test_small_catalogue_returns_fewer() {
        let recommender = build_recommender(&[(1, "Only", "alien")]);
        assert_eq!(recommender.recommend("Only"), Lookup::Found(vec![]));
    }

    #[test]
    fn test_search_ignores_case() {
        let recommender = build_recommender(&[
            (1, "Avatar", "alien"),
            (2, "The Dark Knight", "bat"),
            (3, "Dark City", "noir"),
        ]);

        let hits: Vec<&str> = recommender
            .search("dark")
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(hits, vec!["The Dark Knight", "Dark City"]);
        assert_eq!(recommender.len(), 3);
    }
}

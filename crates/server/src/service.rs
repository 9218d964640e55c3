//! # Recommendation Service
//!
//! Coordinates one request end to end:
//! 1. Look the title up (cached per title)
//! 2. Fetch a poster for each result (cached per movie id)
//! 3. Return titles and poster URLs in rank order
//!
//! Poster fetches run as independent tokio tasks so one slow or failing
//! fetch only costs that item its poster.

use std::sync::Arc;
use std::time::Instant;

use data_loader::MovieId;
use poster_client::PosterSource;
use tracing::{debug, info, warn};

use crate::cache::BoundedCache;
use crate::error::Result;
use crate::recommender::{Lookup, Recommender};

/// Cache sizes for the serving process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub recommendation_cache_capacity: usize,
    pub poster_cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recommendation_cache_capacity: 256,
            poster_cache_capacity: 1024,
        }
    }
}

/// The caches owned by the serving process
pub struct ServiceCaches {
    pub recommendations: BoundedCache<String, Lookup>,
    /// Successful poster URLs only; misses are retried on later requests
    pub posters: BoundedCache<MovieId, String>,
}

impl ServiceCaches {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            recommendations: BoundedCache::new(config.recommendation_cache_capacity)?,
            posters: BoundedCache::new(config.poster_cache_capacity)?,
        })
    }
}

/// One row of the answer shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationResponse {
    pub query: String,
    pub found: bool,
    pub items: Vec<RecommendedMovie>,
}

impl RecommendationResponse {
    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|m| m.title.as_str()).collect()
    }

    pub fn poster_urls(&self) -> Vec<Option<&str>> {
        self.items.iter().map(|m| m.poster_url.as_deref()).collect()
    }
}

/// Recommender plus posters plus caches
#[derive(Clone)]
pub struct RecommendationService {
    recommender: Recommender,
    posters: Arc<dyn PosterSource>,
    caches: Arc<ServiceCaches>,
}

impl RecommendationService {
    pub fn new(
        recommender: Recommender,
        posters: Arc<dyn PosterSource>,
        caches: ServiceCaches,
    ) -> Self {
        Self {
            recommender,
            posters,
            caches: Arc::new(caches),
        }
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    pub fn caches(&self) -> &ServiceCaches {
        &self.caches
    }

    /// Recommend movies similar to `title`, with posters where available
    pub async fn recommend(&self, title: &str) -> RecommendationResponse {
        let start = Instant::now();

        let lookup = self.lookup(title);
        let found = lookup.is_found();
        let posters = self.fetch_posters(&lookup).await;

        let items: Vec<RecommendedMovie> = lookup
            .items()
            .iter()
            .zip(posters)
            .map(|(rec, poster_url)| RecommendedMovie {
                movie_id: rec.movie_id,
                title: rec.title.clone(),
                score: rec.score,
                poster_url,
            })
            .collect();

        info!(
            "Answered {:?} with {} recommendations in {:.2?}",
            title,
            items.len(),
            start.elapsed()
        );
        RecommendationResponse {
            query: title.to_string(),
            found,
            items,
        }
    }

    fn lookup(&self, title: &str) -> Lookup {
        let key = title.to_string();
        if let Some(cached) = self.caches.recommendations.get(&key) {
            debug!("Recommendation cache hit for {:?}", title);
            return cached;
        }
        let lookup = self.recommender.recommend(title);
        self.caches.recommendations.put(key, lookup.clone());
        lookup
    }

    /// One poster slot per recommendation, in rank order
    async fn fetch_posters(&self, lookup: &Lookup) -> Vec<Option<String>> {
        let items = lookup.items();
        let mut posters: Vec<Option<String>> = vec![None; items.len()];
        let mut pending = Vec::new();

        for (slot, item) in items.iter().enumerate() {
            if let Some(url) = self.caches.posters.get(&item.movie_id) {
                posters[slot] = Some(url);
                continue;
            }
            let source = Arc::clone(&self.posters);
            let movie_id = item.movie_id;
            let handle = tokio::spawn(async move { source.fetch_poster(movie_id).await });
            pending.push((slot, movie_id, handle));
        }

        debug!(
            "Fetching {} posters ({} cached)",
            pending.len(),
            items.len() - pending.len()
        );

        for (slot, movie_id, handle) in pending {
            match handle.await {
                Ok(Some(url)) => {
                    self.caches.posters.put(movie_id, url.clone());
                    posters[slot] = Some(url);
                }
                Ok(None) => {}
                Err(e) => warn!("Poster task for movie {} failed: {}", movie_id, e),
            }
        }
        posters
    }
}

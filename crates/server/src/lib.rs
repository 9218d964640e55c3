//! Serving side of the movie recommender.
//!
//! Loads the artifact bundle once, answers title lookups from it, and
//! decorates answers with posters through a [`PosterSource`]. The two LRU
//! caches are the only shared mutable state.
//!
//! [`PosterSource`]: poster_client::PosterSource

pub mod cache;
pub mod error;
pub mod recommender;
pub mod service;

pub use cache::BoundedCache;
pub use error::{Result, ServiceError};
pub use recommender::{Lookup, Recommendation, Recommender, TOP_K};
pub use service::{
    RecommendationResponse, RecommendationService, RecommendedMovie, ServiceCaches, ServiceConfig,
};

//! Poster client for the TMDB movie details API.
//!
//! This crate turns a movie id into a poster image URL. It handles:
//! - Building the request with the pre-shared API key
//! - A per-request timeout
//! - Bounded retries with exponential backoff on transient failures
//! - Degrading to "no poster" on anything unrecoverable
//!
//! Callers that only render results use [`PosterSource::fetch_poster`],
//! which never fails. [`PosterClient::try_fetch_poster`] keeps the reason
//! for callers that care.

use std::time::Duration;

use async_trait::async_trait;
use data_loader::MovieId;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when talking to the poster API
#[derive(Error, Debug)]
pub enum PosterError {
    #[error("Invalid poster client configuration: {0}")]
    InvalidConfig(String),

    #[error("Poster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Poster API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Connection settings for the poster API
#[derive(Debug, Clone)]
pub struct PosterConfig {
    pub api_key: String,
    /// Base URL of the details API (e.g., "https://api.themoviedb.org")
    pub api_url: String,
    /// Prefix joined with `poster_path` to form the image URL
    pub image_base_url: String,
    /// Timeout for a single request
    pub timeout: Duration,
    /// Total attempts per poster, including the first
    pub max_attempts: usize,
    /// Delay before the first retry; doubled for each later one
    pub backoff_base: Duration,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.themoviedb.org".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Anything that can look up a poster URL for a movie.
///
/// Implementations must not fail: a poster that can't be found is `None`.
#[async_trait]
pub trait PosterSource: Send + Sync {
    async fn fetch_poster(&self, movie_id: MovieId) -> Option<String>;
}

/// Poster source used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosters;

#[async_trait]
impl PosterSource for NoPosters {
    async fn fetch_poster(&self, _movie_id: MovieId) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
}

/// HTTP client for the TMDB details endpoint.
#[derive(Clone)]
pub struct PosterClient {
    client: Client,
    config: PosterConfig,
}

impl PosterClient {
    /// Build a client; fails if the API key is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(config: PosterConfig) -> Result<Self, PosterError> {
        if config.api_key.trim().is_empty() {
            return Err(PosterError::InvalidConfig("missing API key".to_string()));
        }
        if config.max_attempts == 0 {
            return Err(PosterError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Fetch a poster URL, keeping the failure reason.
    ///
    /// - `Ok(Some(url))`: the movie has a poster
    /// - `Ok(None)`: the movie is unknown (404) or has no poster
    /// - `Err`: a non-retryable error, or retries ran out
    ///
    /// Transport errors and body read errors on a 2xx response share one
    /// retry budget. Errors never include the request URL.
    pub async fn try_fetch_poster(&self, movie_id: MovieId) -> Result<Option<String>, PosterError> {
        let url = format!(
            "{}/3/movie/{}",
            self.config.api_url.trim_end_matches('/'),
            movie_id
        );

        let mut attempt = 0usize;
        loop {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("api_key", self.config.api_key.as_str()),
                    ("language", "en-US"),
                ])
                .send()
                .await;

            let err = match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        match resp.json::<MovieDetails>().await {
                            Ok(details) => {
                                return Ok(details
                                    .poster_path
                                    .filter(|path| !path.trim().is_empty())
                                    .map(|path| self.poster_url(&path)));
                            }
                            Err(err) => err,
                        }
                    } else {
                        if status == StatusCode::NOT_FOUND {
                            debug!("No details for movie {}", movie_id);
                            return Ok(None);
                        }

                        let body = resp
                            .text()
                            .await
                            .unwrap_or_else(|_| "<body unavailable>".to_string());
                        if self.should_retry(status) && attempt + 1 < self.config.max_attempts {
                            attempt += 1;
                            debug!(
                                "Poster request for {} returned {}, retry {}",
                                movie_id, status, attempt
                            );
                            tokio::time::sleep(self.retry_backoff(attempt)).await;
                            continue;
                        }
                        return Err(PosterError::Status {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
                Err(err) => err,
            };

            // The request URL carries the API key as a query parameter
            let err = err.without_url();
            if self.is_retryable_error(&err) && attempt + 1 < self.config.max_attempts {
                attempt += 1;
                debug!(
                    "Poster request for {} failed ({}), retry {}",
                    movie_id, err, attempt
                );
                tokio::time::sleep(self.retry_backoff(attempt)).await;
                continue;
            }
            return Err(PosterError::Http(err));
        }
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.image_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.saturating_sub(1).min(5) as u32;
        self.config.backoff_base * (1 << capped)
    }
}

#[async_trait]
impl PosterSource for PosterClient {
    async fn fetch_poster(&self, movie_id: MovieId) -> Option<String> {
        match self.try_fetch_poster(movie_id).await {
            Ok(poster) => poster,
            Err(e) => {
                warn!("Poster unavailable for movie {}: {}", movie_id, e);
                None
            }
        }
    }
}

//! End-to-end: offline pipeline -> artifact store -> recommendation service.

use std::sync::Arc;

use artifact_store::{ArtifactBundle, ArtifactStore, StoreError};
use data_loader::{MovieAttributes, MovieCredits, RawMovie, join_on_title};
use pipeline::{OfflinePipeline, PipelineConfig};
use poster_client::NoPosters;
use server::{RecommendationService, Recommender, ServiceCaches, ServiceConfig, ServiceError};
use tempfile::TempDir;

fn movie(id: u32, title: &str, overview: &str, genre: &str, director: &str) -> RawMovie {
    RawMovie {
        movie_id: id,
        title: title.to_string(),
        overview: overview.to_string(),
        genres: format!(r#"[{{"id": 1, "name": "{}"}}]"#, genre),
        keywords: "[]".to_string(),
        cast: "[]".to_string(),
        crew: format!(r#"[{{"job": "Director", "name": "{}"}}]"#, director),
    }
}

fn build_and_save(dir: &TempDir) -> ArtifactStore {
    let movies = vec![
        movie(19995, "Avatar", "marine on an alien moon", "Science Fiction", "James Cameron"),
        movie(679, "Aliens", "marine squad fights alien hive", "Science Fiction", "James Cameron"),
        movie(3114, "The Searchers", "cowboy hunts across the desert", "Western", "John Ford"),
        movie(11, "Star Wars", "rebels fight an empire in space", "Science Fiction", "George Lucas"),
    ];

    let config = PipelineConfig::default();
    let output = OfflinePipeline::new(config)
        .unwrap()
        .run_on(&movies)
        .unwrap();
    let bundle = ArtifactBundle::from_pipeline(output, config.max_features).unwrap();

    let store = ArtifactStore::new(dir.path().join("artifacts"));
    store.save(&bundle).unwrap();
    store
}

#[tokio::test]
async fn test_saved_bundle_serves_recommendations() {
    let dir = TempDir::new().unwrap();
    let store = build_and_save(&dir);

    let recommender = Recommender::from_store(&store).unwrap();
    assert_eq!(recommender.len(), 4);

    let service = RecommendationService::new(
        recommender,
        Arc::new(NoPosters),
        ServiceCaches::new(&ServiceConfig::default()).unwrap(),
    );

    let response = service.recommend("Avatar").await;
    assert!(response.found);
    assert_eq!(response.items.len(), 3);
    assert_eq!(response.items[0].title, "Aliens");
    assert!(!response.titles().contains(&"Avatar"));
    assert!(response.poster_urls().iter().all(Option::is_none));
}

#[test]
fn test_missing_artifacts_surface_through_service_error() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("never-built"));

    let err = Recommender::from_store(&store).err().unwrap();
    assert!(matches!(
        err,
        ServiceError::Store(StoreError::ArtifactsMissing { .. })
    ));
}

fn attributes(id: u32, title: &str, overview: &str, genre: &str) -> MovieAttributes {
    MovieAttributes {
        id: Some(id),
        title: Some(title.to_string()),
        overview: Some(overview.to_string()),
        genres: Some(format!(r#"[{{"id": 1, "name": "{}"}}]"#, genre)),
        keywords: Some("[]".to_string()),
    }
}

fn credit_row(id: u32, title: &str, director: &str) -> MovieCredits {
    MovieCredits {
        movie_id: Some(id),
        title: Some(title.to_string()),
        cast: Some("[]".to_string()),
        crew: Some(format!(r#"[{{"job": "Director", "name": "{}"}}]"#, director)),
    }
}

#[test]
fn test_shared_title_is_never_recommended_to_itself() {
    let movies = vec![
        attributes(1255, "The Host", "a monster rises from the han river", "Horror"),
        attributes(72710, "The Host", "alien souls take over human bodies", "Science Fiction"),
        attributes(5, "Other", "a monster attacks the river city", "Horror"),
    ];
    let credits = vec![
        credit_row(1255, "The Host", "Bong Joon-ho"),
        credit_row(72710, "The Host", "Andrew Niccol"),
        credit_row(5, "Other", "Bong Joon-ho"),
    ];

    let joined = join_on_title(&movies, &credits);
    let mut ids: Vec<_> = joined.movies.iter().map(|m| m.movie_id).collect();
    assert_eq!(ids, vec![1255, 72710, 5]);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    let config = PipelineConfig::default();
    let output = OfflinePipeline::new(config)
        .unwrap()
        .run_on(&joined.movies)
        .unwrap();
    let bundle = ArtifactBundle::from_pipeline(output, config.max_features).unwrap();
    let recommender = Recommender::new(Arc::new(bundle));

    let lookup = recommender.recommend("The Host");
    assert!(lookup.is_found());
    let recommended = lookup.movie_ids();
    assert!(!recommended.contains(&1255));
    assert_eq!(recommended.len(), 2);
    assert_eq!(recommended[0], 5);
}

//! Save/load tests against a real temp directory.

use artifact_store::{ArtifactBundle, ArtifactStore, MOVIES_FILE, SIMILARITY_FILE, StoreError};
use data_loader::MovieRecord;
use pipeline::{CountVectorizer, Precision, cosine_similarity_matrix};
use std::fs;
use tempfile::TempDir;

fn build_bundle(docs: &[&str], precision: Precision) -> ArtifactBundle {
    let (vocabulary, vectors) = CountVectorizer::new(5000).fit_transform(docs);
    let movies = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            MovieRecord::new(
                100 + i as u32,
                format!("Movie {}", i),
                doc.split_whitespace().map(str::to_string).collect(),
            )
        })
        .collect();
    ArtifactBundle::new(
        movies,
        cosine_similarity_matrix(&vectors, precision),
        vocabulary.len(),
        5000,
    )
    .unwrap()
}

#[test]
fn test_round_trip_preserves_alignment() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let bundle = build_bundle(&["alien ship", "alien marine", "cowboy horse"], Precision::Double);

    store.save(&bundle).unwrap();
    assert!(store.exists());

    let loaded = store.load().unwrap();
    assert_eq!(loaded.movies, bundle.movies);
    assert_eq!(loaded.similarity, bundle.similarity);
    assert_eq!(loaded.manifest.movie_count, 3);
    assert_eq!(loaded.manifest.precision, Precision::Double);
    assert_eq!(loaded.manifest.vocabulary_size, bundle.manifest.vocabulary_size);
}

#[test]
fn test_single_precision_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    let bundle = build_bundle(&["alien ship", "alien marine"], Precision::Single);

    store.save(&bundle).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.similarity.precision(), Precision::Single);
    assert_eq!(loaded.similarity.get(0, 1), bundle.similarity.get(0, 1));
}

#[test]
fn test_missing_artifacts_are_distinguishable() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());

    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::ArtifactsMissing { .. }));

    // Half a bundle is still a missing bundle
    store.save(&build_bundle(&["alien"], Precision::Single)).unwrap();
    fs::remove_file(dir.path().join(SIMILARITY_FILE)).unwrap();
    assert!(matches!(
        store.load(),
        Err(StoreError::ArtifactsMissing { .. })
    ));
}

#[test]
fn test_matrix_from_another_build_is_rejected() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let store_a = ArtifactStore::new(dir_a.path());
    let store_b = ArtifactStore::new(dir_b.path());

    store_a
        .save(&build_bundle(&["alien ship", "cowboy horse"], Precision::Single))
        .unwrap();
    store_b
        .save(&build_bundle(&["cowboy horse", "alien ship"], Precision::Double))
        .unwrap();

    fs::copy(
        dir_b.path().join(SIMILARITY_FILE),
        dir_a.path().join(SIMILARITY_FILE),
    )
    .unwrap();

    assert!(matches!(store_a.load(), Err(StoreError::Corrupt { .. })));
}

#[test]
fn test_garbage_index_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.save(&build_bundle(&["alien"], Precision::Single)).unwrap();

    fs::write(dir.path().join(MOVIES_FILE), b"{not json").unwrap();

    assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
}

#[test]
fn test_unknown_format_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.save(&build_bundle(&["alien"], Precision::Single)).unwrap();

    let path = dir.path().join(MOVIES_FILE);
    let index = fs::read_to_string(&path).unwrap();
    fs::write(&path, index.replace("\"format_version\":1", "\"format_version\":99")).unwrap();

    assert!(matches!(
        store.load(),
        Err(StoreError::UnsupportedVersion { found: 99, .. })
    ));
}

#[test]
fn test_unwritable_destination_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, b"file").unwrap();

    let store = ArtifactStore::new(blocker.join("artifacts"));
    let err = store
        .save(&build_bundle(&["alien"], Precision::Single))
        .unwrap_err();

    assert!(matches!(err, StoreError::Io { .. }));
}

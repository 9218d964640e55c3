//! Saving and loading bundles on disk.
//!
//! A bundle is two files in one directory:
//! - `movies.json`: manifest + movie index (serde_json, readable by hand)
//! - `similarity.bin`: the matrix (bincode)
//!
//! Each file is written to a temporary sibling and renamed into place. The
//! manifest carries a digest of the matrix bytes, so an index paired with a
//! matrix from a different build is detected on load.

use crate::bundle::{ArtifactBundle, BundleManifest, FORMAT_VERSION, check_alignment};
use crate::error::{Result, StoreError};
use data_loader::MovieRecord;
use pipeline::SimilarityMatrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MOVIES_FILE: &str = "movies.json";
pub const SIMILARITY_FILE: &str = "similarity.bin";

#[derive(Serialize, Deserialize)]
struct MovieIndexFile {
    manifest: BundleManifest,
    movies: Vec<MovieRecord>,
}

/// Directory-backed store for one artifact bundle
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn movies_path(&self) -> PathBuf {
        self.dir.join(MOVIES_FILE)
    }

    pub fn similarity_path(&self) -> PathBuf {
        self.dir.join(SIMILARITY_FILE)
    }

    /// True when both blobs are present
    pub fn exists(&self) -> bool {
        self.movies_path().is_file() && self.similarity_path().is_file()
    }

    /// Persist a bundle, replacing any previous one
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<()> {
        check_alignment(&bundle.movies, &bundle.similarity)?;
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let similarity_path = self.similarity_path();
        let matrix_bytes =
            bincode::serialize(&bundle.similarity).map_err(|e| StoreError::Encode {
                path: similarity_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let movies_path = self.movies_path();
        let index = MovieIndexFile {
            manifest: BundleManifest {
                movie_count: bundle.movies.len(),
                similarity_digest: digest(&matrix_bytes),
                ..bundle.manifest.clone()
            },
            movies: bundle.movies.clone(),
        };
        let index_bytes = serde_json::to_vec(&index).map_err(|e| StoreError::Encode {
            path: movies_path.display().to_string(),
            reason: e.to_string(),
        })?;

        write_atomic(&similarity_path, &matrix_bytes)?;
        write_atomic(&movies_path, &index_bytes)?;

        info!(
            "Saved {} movies and a {}x{} matrix to {}",
            bundle.movies.len(),
            bundle.similarity.dimension(),
            bundle.similarity.dimension(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load the bundle, verifying version, digest and row alignment
    pub fn load(&self) -> Result<ArtifactBundle> {
        if !self.exists() {
            return Err(self.missing());
        }

        let movies_path = self.movies_path();
        let index_bytes = self.read(&movies_path)?;
        let index: MovieIndexFile =
            serde_json::from_slice(&index_bytes).map_err(|e| corrupt(&movies_path, e))?;

        if index.manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: index.manifest.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let similarity_path = self.similarity_path();
        let matrix_bytes = self.read(&similarity_path)?;
        if digest(&matrix_bytes) != index.manifest.similarity_digest {
            return Err(StoreError::Corrupt {
                path: similarity_path.display().to_string(),
                reason: format!("matrix does not match the index in {}", MOVIES_FILE),
            });
        }
        let similarity: SimilarityMatrix =
            bincode::deserialize(&matrix_bytes).map_err(|e| corrupt(&similarity_path, e))?;
        if !similarity.is_well_formed() {
            return Err(StoreError::Corrupt {
                path: similarity_path.display().to_string(),
                reason: "matrix is not square".to_string(),
            });
        }

        check_alignment(&index.movies, &similarity)?;

        info!(
            "Loaded {} movies ({} precision, vocabulary {}) from {}",
            index.movies.len(),
            index.manifest.precision,
            index.manifest.vocabulary_size,
            self.dir.display()
        );
        Ok(ArtifactBundle {
            manifest: index.manifest,
            movies: index.movies,
            similarity,
        })
    }

    fn missing(&self) -> StoreError {
        StoreError::ArtifactsMissing {
            dir: self.dir.display().to_string(),
        }
    }

    /// Read a blob; a file that vanished since `exists()` is still "missing"
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => self.missing(),
            _ => io_error(path, e),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Write to a temporary sibling, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

/// 64-bit FNV-1a; stable across platforms and toolchains
fn digest(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}

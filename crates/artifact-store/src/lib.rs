//! Artifact store for the recommender.
//!
//! The offline pipeline saves an [`ArtifactBundle`]; the serving side loads
//! it once at startup. A missing bundle is reported as
//! [`StoreError::ArtifactsMissing`] rather than a generic I/O error so the
//! front-end can tell the user to run the preprocessing step.

pub mod bundle;
pub mod error;
pub mod store;

pub use bundle::{ArtifactBundle, BundleManifest, FORMAT_VERSION};
pub use error::{Result, StoreError};
pub use store::{ArtifactStore, MOVIES_FILE, SIMILARITY_FILE};

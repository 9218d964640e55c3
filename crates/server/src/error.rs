use thiserror::Error;

/// Errors raised while setting up the serving side
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid service configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] artifact_store::StoreError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read dataset '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Malformed dataset '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Malformed CSV source '{0}'")]
    Csv(PathBuf, #[source] csv::Error),

    #[error("Failed to encode dataset")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to write dataset '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to replace dataset '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

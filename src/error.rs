use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Browser API error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

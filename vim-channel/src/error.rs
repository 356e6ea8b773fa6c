use thiserror::Error;
use walker_core::HostError;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("malformed message from editor: {0}")]
    Malformed(String),

    #[error("invalid JSON from editor: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ChannelError>;

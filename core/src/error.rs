use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum WalkerError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot read walk root {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: [{0}]")]
    SelectionMissing(String),

    #[error("invalid walk arguments: {0}")]
    InvalidArgs(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("editor call failed: {0}")]
    Host(#[from] HostError),
}

impl WalkerError {
    pub(crate) fn invalid_pattern(pattern: &str, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        }
    }

    pub(crate) fn root_unreadable(path: PathBuf, source: std::io::Error) -> Self {
        Self::RootUnreadable { path, source }
    }
}

pub type Result<T> = std::result::Result<T, WalkerError>;

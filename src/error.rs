//! Error types for the raftstore client.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can end a single client invocation.
///
/// Application-level failures (an envelope with a non-zero `code`) are not
/// errors: the envelope is printed as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Usage(String),

    #[error("HTTP ERROR: {}", .0.as_u16())]
    HttpStatus(reqwest::StatusCode),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Read and encode file {} failed: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Read and encode file {} failed: {source}", .path.display())]
    FileEncode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    pub fn usage(message: impl Into<String>) -> Self {
        ClientError::Usage(message.into())
    }
}

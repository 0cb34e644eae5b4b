//! MCP error types.

use thiserror::Error;

/// Fatal transport errors. Per-request problems are answered on the wire
/// and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// Startup and subcommand failures. Tool call failures never reach here;
/// they are reported to the host inside the tool result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The token client could not be set up.
    #[error(transparent)]
    Auth(#[from] graph::AuthError),

    /// The tenant could not be reached or rejected a request.
    #[error(transparent)]
    Graph(#[from] graph::GraphError),

    /// The stdio transport failed.
    #[error(transparent)]
    Transport(#[from] mcp::Error),

    #[error("failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    /// The log filter could not be parsed.
    #[error("invalid log level '{level}': {message}")]
    LogLevel { level: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

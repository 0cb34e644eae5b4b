use graph::GraphError;
use thiserror::Error;

/// Why a tool call failed.
///
/// Display text is what the host sees in the failure envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument is absent or empty. Holds the display label.
    #[error("{0} required")]
    MissingArgument(String),

    #[error("{name} {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The adapter failed after validation passed.
    #[error("Error executing {tool}: {source}")]
    Upstream {
        tool: &'static str,
        source: GraphError,
    },
}

impl ToolError {
    /// True for errors caught before any upstream call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ToolError::UnknownTool(_)
                | ToolError::MissingArgument(_)
                | ToolError::InvalidArgument { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;

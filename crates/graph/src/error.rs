use thiserror::Error;

/// Errors from acquiring an access token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The identity provider rejected the client credentials.
    #[error("authentication failed: identity provider returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The identity provider could not be reached.
    #[error("authentication failed: {0}")]
    Network(String),

    /// The token endpoint answered with something other than a token.
    #[error("authentication failed: invalid token response: {0}")]
    InvalidResponse(String),
}

/// Errors from calling the Graph API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("network error: {0}")]
    Network(String),

    #[error("Graph API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Turn a 404 into `None`, leaving every other outcome alone.
pub(crate) fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Extract the human-readable message from a Graph or identity-platform error body.
///
/// Graph answers `{"error": {"code", "message"}}`; the token endpoint answers
/// `{"error", "error_description"}`. Anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    let message = json
        .pointer("/error/message")
        .or_else(|| json.get("error_description"))
        .and_then(|m| m.as_str());

    match message {
        Some(message) => message.to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_becomes_none() {
        let result: Result<u8> = Err(GraphError::NotFound {
            path: "/users/x".to_string(),
        });
        assert!(matches!(optional(result), Ok(None)));
    }

    #[test]
    fn other_errors_pass_through() {
        let result: Result<u8> = Err(GraphError::Network("reset".to_string()));
        assert!(matches!(optional(result), Err(GraphError::Network(_))));
    }

    #[test]
    fn graph_error_body_message() {
        let body = r#"{"error":{"code":"Authorization_RequestDenied","message":"Insufficient privileges"}}"#;
        assert_eq!(error_message(body), "Insufficient privileges");
    }

    #[test]
    fn token_error_body_message() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#;
        assert_eq!(error_message(body), "AADSTS7000215: Invalid client secret");
    }

    #[test]
    fn plain_body_is_kept() {
        assert_eq!(error_message(" gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn auth_errors_say_authentication_failed() {
        let err = GraphError::from(AuthError::Network("dns".to_string()));
        assert_eq!(err.to_string(), "authentication failed: dns");
    }
}

//! Configuration loading from graph-mcp.toml.

use std::path::Path;
use std::time::Duration;

use graph::{Credentials, DEFAULT_AUTHORITY, DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_TIMEOUT};
use serde::Deserialize;

/// Environment variables that override `[azure]` settings.
pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// App registration used for client-credential auth.
    #[serde(default)]
    pub azure: AzureConfig,

    /// Graph endpoint and request limits.
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct AzureConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Identity provider base URL.
    #[serde(default = "default_authority")]
    pub authority: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority: default_authority(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on `@odata.nextLink` pages followed per collection.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl GraphConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override `[azure]` credentials from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Override `[azure]` credentials from `lookup`. Blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        if let Some(v) = get(TENANT_ID_VAR) {
            self.azure.tenant_id = Some(v);
        }
        if let Some(v) = get(CLIENT_ID_VAR) {
            self.azure.client_id = Some(v);
        }
        if let Some(v) = get(CLIENT_SECRET_VAR) {
            self.azure.client_secret = Some(v);
        }
        self
    }

    /// Build the client credentials from config.
    ///
    /// Requires tenant_id, client_id and client_secret to be set and non-blank.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            tenant_id: require(&self.azure.tenant_id, TENANT_ID_VAR)?,
            client_id: require(&self.azure.client_id, CLIENT_ID_VAR)?,
            client_secret: require(&self.azure.client_secret, CLIENT_SECRET_VAR)?,
            authority: self.azure.authority.clone(),
        })
    }
}

fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingCredential(name))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("credential not configured: set {0} or the matching [azure] key")]
    MissingCredential(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL: &str = r#"
[azure]
tenant_id = "contoso.onmicrosoft.com"
client_id = "app-id"
client_secret = "shh"

[graph]
base_url = "https://graph.microsoft.com/beta"
timeout_secs = 10
max_pages = 5

[log]
level = "debug"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn parse_full_config() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.graph.base_url, "https://graph.microsoft.com/beta");
        assert_eq!(config.graph.timeout(), Duration::from_secs(10));
        assert_eq!(config.graph.max_pages, 5);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.azure.authority, DEFAULT_AUTHORITY);

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.tenant_id, "contoso.onmicrosoft.com");
        assert_eq!(credentials.client_secret, "shh");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.graph.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.graph.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.graph.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn missing_credential_is_named() {
        let config = Config::parse("[azure]\ntenant_id = \"t\"\nclient_id = \"c\"\n").unwrap();
        let err = config.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(CLIENT_SECRET_VAR)));
        assert!(err.to_string().contains("AZURE_CLIENT_SECRET"));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = Config::parse("[azure]\ntenant_id = \"  \"").unwrap();
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingCredential(TENANT_ID_VAR))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let config = Config::parse(FULL)
            .unwrap()
            .with_overrides(env(&[(CLIENT_SECRET_VAR, "from-env"), (TENANT_ID_VAR, " ")]));

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.client_secret, "from-env");
        assert_eq!(credentials.tenant_id, "contoso.onmicrosoft.com");
    }

    #[test]
    fn environment_alone_is_enough() {
        let config = Config::default().with_overrides(env(&[
            (TENANT_ID_VAR, "t"),
            (CLIENT_ID_VAR, "c"),
            (CLIENT_SECRET_VAR, "s"),
        ]));
        assert!(config.credentials().is_ok());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::parse("[graph]\ntimeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("/nonexistent/graph-mcp.toml").unwrap();
        assert_eq!(config.graph.base_url, DEFAULT_BASE_URL);
    }
}

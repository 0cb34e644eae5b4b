//! OAuth2 client-credential token acquisition.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::DEFAULT_TIMEOUT;
use crate::error::{AuthError, error_message};

/// Default Microsoft identity platform host.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Scope requesting every application permission granted to the app.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

// Tokens this close to expiry are treated as already expired.
const EXPIRY_BUFFER_SECS: i64 = 60;

// Used when the token endpoint omits expires_in.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

// Upper bound on a reported token lifetime.
const MAX_LIFETIME_SECS: i64 = 86_400;

/// Source of bearer tokens for the Graph API.
pub trait TokenSource: Send + Sync {
    /// Return a token that is valid now, refreshing it if needed.
    fn access_token(&self) -> impl Future<Output = Result<String, AuthError>> + Send;
}

/// App registration credentials for the client-credential flow.
#[derive(Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authority: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authority", &self.authority)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > TimeDelta::seconds(EXPIRY_BUFFER_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Client-credential token source with an in-memory cache.
///
/// The cache is the only state shared between tool calls. Readers reuse the
/// cached token; a refresh takes the write lock so concurrent callers wait
/// for one request instead of each fetching their own token.
pub struct ClientCredentials {
    http: reqwest::Client,
    credentials: Credentials,
    cache: RwLock<Option<CachedToken>>,
}

impl ClientCredentials {
    pub fn new(credentials: Credentials) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(http, credentials)
    }

    /// Token requests give up after `timeout`.
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        Ok(Self::with_client(http, credentials))
    }

    pub fn with_client(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            cache: RwLock::new(None),
        }
    }

    fn token_url(&self) -> String {
        let authority = self.credentials.authority.trim_end_matches('/');
        let tenant = &self.credentials.tenant_id;
        format!("{authority}/{tenant}/oauth2/v2.0/token")
    }

    async fn acquire(&self) -> Result<CachedToken, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
        ];

        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status,
                message: error_message(&body),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: expiry(Utc::now(), token.expires_in),
        })
    }
}

/// Expiry instant for a token issued at `now`, with the lifetime clamped to
/// `0..=MAX_LIFETIME_SECS`.
fn expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let secs = expires_in
        .unwrap_or(DEFAULT_LIFETIME_SECS)
        .clamp(0, MAX_LIFETIME_SECS);
    now + TimeDelta::seconds(secs)
}

impl TokenSource for ClientCredentials {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(Utc::now())) {
                return Ok(cached.token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Someone else may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(Utc::now())) {
            return Ok(cached.token.clone());
        }

        let fresh = self.acquire().await?;
        debug!(expires_at = %fresh.expires_at, "acquired access token");
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}

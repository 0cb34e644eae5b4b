//! Authenticated Graph REST client.

use std::future::Future;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenSource;
use crate::error::{GraphError, Result, error_message};

/// Graph v1.0 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on `@odata.nextLink` pages followed for one collection.
pub const DEFAULT_MAX_PAGES: usize = 20;

/// OData query options for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    select: Vec<String>,
    filter: Option<String>,
    expand: Option<String>,
    top: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    /// Ask for at most `n` records. A limited query never follows `@odata.nextLink`.
    pub fn top(mut self, n: u32) -> Self {
        self.top = Some(n);
        self
    }

    pub fn is_limited(&self) -> bool {
        self.top.is_some()
    }

    /// Query-string pairs, unencoded.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.select.is_empty() {
            pairs.push(("$select", self.select.join(",")));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        if let Some(expand) = &self.expand {
            pairs.push(("$expand", expand.clone()));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        pairs
    }
}

/// The upstream API as seen by the adapters.
///
/// Payloads are returned as JSON values; adapters decode them into raw
/// record types and normalize before anything leaves the adapter.
pub trait GraphApi: Send + Sync {
    /// Fetch every record of a collection, following pagination.
    fn list(&self, path: &str, query: &Query) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Fetch a single object. A 404 is reported as [`GraphError::NotFound`].
    fn get(&self, path: &str, query: &Query) -> impl Future<Output = Result<Value>> + Send;

    /// Create a resource and return the created object.
    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value>> + Send;
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
struct Page {
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// Builder for creating a Graph client.
pub struct GraphClientBuilder<T> {
    tokens: T,
    base_url: String,
    timeout: Duration,
    max_pages: usize,
}

impl<T: TokenSource> GraphClientBuilder<T> {
    pub fn new(tokens: T) -> Self {
        Self {
            tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn build(self) -> Result<GraphClient<T>> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GraphError::Network(e.to_string()))?;

        Ok(GraphClient {
            http,
            tokens: self.tokens,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            max_pages: self.max_pages,
        })
    }
}

/// Graph API client authenticating every request with a bearer token.
pub struct GraphClient<T> {
    http: reqwest::Client,
    tokens: T,
    base_url: String,
    max_pages: usize,
}

impl<T: TokenSource> GraphClient<T> {
    pub fn builder(tokens: T) -> GraphClientBuilder<T> {
        GraphClientBuilder::new(tokens)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Value> {
        let token = self.tokens.access_token().await?;

        let response = request
            .bearer_auth(token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| GraphError::Network(e.to_string()))?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "graph response");

        if status == StatusCode::NOT_FOUND {
            return Err(GraphError::NotFound {
                path: path.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))
    }

    async fn page(&self, request: RequestBuilder, path: &str) -> Result<Page> {
        let value = self.send(request, path).await?;
        serde_json::from_value(value)
            .map_err(|e| GraphError::InvalidResponse(format!("{path}: not a collection: {e}")))
    }
}

impl<T: TokenSource> GraphApi for GraphClient<T> {
    async fn list(&self, path: &str, query: &Query) -> Result<Vec<Value>> {
        let first = self.http.get(self.url(path)).query(&query.pairs());
        let mut page = self.page(first, path).await?;
        let mut records = Vec::new();
        let mut fetched = 1;

        loop {
            records.extend(page.value);

            let Some(next) = page.next_link else {
                break;
            };
            if query.is_limited() {
                break;
            }
            if fetched >= self.max_pages {
                warn!(path, pages = fetched, "page limit reached, collection truncated");
                break;
            }

            // nextLink is absolute and already carries the query options.
            page = self.page(self.http.get(next), path).await?;
            fetched += 1;
        }

        Ok(records)
    }

    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let request = self.http.get(self.url(path)).query(&query.pairs());
        self.send(request, path).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    struct NoTokens;

    impl TokenSource for NoTokens {
        async fn access_token(&self) -> std::result::Result<String, AuthError> {
            Err(AuthError::Network("offline".to_string()))
        }
    }

    #[test]
    fn empty_query_has_no_pairs() {
        assert!(Query::new().pairs().is_empty());
    }

    #[test]
    fn query_pairs_in_stable_order() {
        let query = Query::new()
            .top(50)
            .expand("assignments")
            .filter("startswith(displayName,'a')")
            .select(&["id", "displayName"]);
        assert_eq!(
            query.pairs(),
            vec![
                ("$select", "id,displayName".to_string()),
                ("$filter", "startswith(displayName,'a')".to_string()),
                ("$expand", "assignments".to_string()),
                ("$top", "50".to_string()),
            ]
        );
        assert!(query.is_limited());
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = GraphClient::builder(NoTokens)
            .base_url("https://graph.example/v1.0/")
            .build()
            .unwrap();
        assert_eq!(client.url("/users"), "https://graph.example/v1.0/users");
        assert_eq!(client.url("groups"), "https://graph.example/v1.0/groups");
    }

    #[test]
    fn max_pages_is_at_least_one() {
        let client = GraphClient::builder(NoTokens).max_pages(0).build().unwrap();
        assert_eq!(client.max_pages, 1);
    }

    #[tokio::test]
    async fn token_failure_stops_request() {
        let client = GraphClient::builder(NoTokens)
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = client.list("/users", &Query::new()).await.unwrap_err();
        assert!(matches!(err, GraphError::Auth(_)));
    }

    #[test]
    fn page_requires_value() {
        let page: std::result::Result<Page, _> =
            serde_json::from_value(serde_json::json!({"id": "x"}));
        assert!(page.is_err());
    }

    #[test]
    fn page_reads_next_link() {
        let page: Page = serde_json::from_value(serde_json::json!({
            "value": [{"id": "1"}],
            "@odata.nextLink": "https://graph.example/v1.0/users?$skiptoken=abc"
        }))
        .unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_some());
    }
}

//! In-memory [`GraphApi`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::client::{GraphApi, Query};
use crate::error::{AuthError, GraphError, Result};

/// Canned answer for one path.
#[derive(Debug, Clone)]
pub enum Reply {
    Collection(Vec<Value>),
    Object(Value),
    NotFound,
    Status(u16, String),
    AuthFailure(String),
}

impl Reply {
    pub fn collection(values: Vec<Value>) -> Self {
        Reply::Collection(values)
    }

    pub fn object(value: Value) -> Self {
        Reply::Object(value)
    }
}

/// Fake upstream keyed by exact request path.
///
/// Unrouted paths answer 404. Every call is counted and its query recorded.
#[derive(Debug, Default)]
pub struct FakeGraph {
    routes: HashMap<String, Reply>,
    calls: AtomicUsize,
    queries: Mutex<Vec<(String, Query)>>,
    posts: Mutex<Vec<(String, Value)>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, reply: Reply) -> Self {
        self.routes.insert(path.to_string(), reply);
        self
    }

    /// Number of upstream calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query sent with the most recent request to `path`.
    pub fn last_query(&self, path: &str) -> Option<Query> {
        let queries = self.queries.lock().ok()?;
        queries
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, q)| q.clone())
    }

    /// Body of the most recent POST to `path`.
    pub fn last_post(&self, path: &str) -> Option<Value> {
        let posts = self.posts.lock().ok()?;
        posts
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
    }

    fn answer(&self, path: &str) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.routes.get(path).cloned() {
            None | Some(Reply::NotFound) => Err(GraphError::NotFound {
                path: path.to_string(),
            }),
            Some(Reply::Status(status, message)) => Err(GraphError::Status { status, message }),
            Some(Reply::AuthFailure(message)) => Err(AuthError::Network(message).into()),
            Some(reply) => Ok(reply),
        }
    }

    fn record(&self, path: &str, query: &Query) {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((path.to_string(), query.clone()));
        }
    }
}

impl GraphApi for FakeGraph {
    async fn list(&self, path: &str, query: &Query) -> Result<Vec<Value>> {
        self.record(path, query);
        match self.answer(path)? {
            Reply::Collection(values) => Ok(values),
            other => Err(GraphError::InvalidResponse(format!(
                "{path}: expected a collection, routed {other:?}"
            ))),
        }
    }

    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        self.record(path, query);
        match self.answer(path)? {
            Reply::Object(value) => Ok(value),
            other => Err(GraphError::InvalidResponse(format!(
                "{path}: expected an object, routed {other:?}"
            ))),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((path.to_string(), body.clone()));
        }
        match self.answer(path)? {
            Reply::Object(value) => Ok(value),
            other => Err(GraphError::InvalidResponse(format!(
                "{path}: expected an object, routed {other:?}"
            ))),
        }
    }
}

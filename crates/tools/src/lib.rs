//! Graph tool catalogue and dispatcher.
//!
//! [`Dispatcher`] owns the fixed [`Catalogue`], validates arguments, calls the
//! `graph` adapters and renders their records as text. It implements
//! [`mcp::Handler`], so it can be handed straight to [`mcp::Server`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use graph::{ClientCredentials, Credentials, GraphClient};
//! use tools::Dispatcher;
//!
//! # async fn example(credentials: Credentials) -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphClient::builder(ClientCredentials::new(credentials)).build()?;
//! let server = mcp::Server::new(Dispatcher::new(Arc::new(client)));
//! server.serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod args;
mod catalogue;
mod dispatcher;
mod error;
mod format;
mod handler;

pub use args::{Arguments, validate};
pub use catalogue::{ArgSpec, Catalogue, Operation, ToolDescriptor};
pub use dispatcher::{Dispatcher, Envelope, Invocation};
pub use error::{Result, ToolError};

/// Name reported in the initialize handshake.
pub const SERVER_NAME: &str = "graph-mcp";

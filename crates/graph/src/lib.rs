//! Microsoft Graph access for device management, directory and security data.
//!
//! The crate is organized in three layers:
//!
//! - **Auth**: [`TokenSource`] and the client-credential implementation
//!   [`ClientCredentials`], which caches its token until shortly before expiry.
//! - **Client**: [`GraphApi`], the upstream seam, and [`GraphClient`], its
//!   reqwest implementation with `@odata.nextLink` pagination.
//! - **Adapters**: [`DeviceService`], [`DirectoryService`] and
//!   [`SecurityService`], which fetch raw payloads and normalize them into the
//!   records in [`model`]. Normalized records always have every field set.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use graph::{ClientCredentials, Credentials, DEFAULT_AUTHORITY, DirectoryService, GraphClient};
//!
//! # async fn example() -> graph::Result<()> {
//! let tokens = ClientCredentials::new(Credentials {
//!     tenant_id: "contoso.onmicrosoft.com".into(),
//!     client_id: "00000000-0000-0000-0000-000000000000".into(),
//!     client_secret: "secret".into(),
//!     authority: DEFAULT_AUTHORITY.into(),
//! });
//! let client = Arc::new(GraphClient::builder(tokens).build()?);
//!
//! let directory = DirectoryService::new(client);
//! for user in directory.search_users("ada").await? {
//!     println!("{} <{}>", user.display_name, user.mail);
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod devices;
mod directory;
mod error;
pub mod model;
pub mod odata;
mod raw;
mod security;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{ClientCredentials, Credentials, DEFAULT_AUTHORITY, GRAPH_SCOPE, TokenSource};
pub use client::{
    DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_TIMEOUT, GraphApi, GraphClient,
    GraphClientBuilder, Query,
};
pub use devices::DeviceService;
pub use directory::DirectoryService;
pub use error::{AuthError, GraphError, Result};
pub use security::{FEED_LIMIT, SecurityService};

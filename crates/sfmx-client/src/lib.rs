//! # sfmx-client
//!
//! Authenticated HTTP client for the Salesforce data API.
//!
//! This crate provides the network plumbing the export pipeline sits on:
//! - `OrgClient`: bearer-token requests against an org's REST endpoints
//! - SOQL query execution with automatic `nextRecordsUrl` pagination
//! - Retry with exponential backoff and jitter for transient failures
//! - Status-code to error mapping, including Salesforce error bodies
//! - SOQL escaping utilities for injection prevention
//!
//! Retries live here, at the API-call layer; callers building pipelines on
//! top of this client are expected not to retry themselves.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfmx_client::OrgClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfmx_client::Error> {
//!     let client = OrgClient::new("https://myorg.my.salesforce.com", "session-token")?;
//!
//!     let users: Vec<serde_json::Value> = client
//!         .query_all("SELECT Id, Username FROM User LIMIT 10")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod retry;
pub mod security;

pub use client::{ApiSurface, OrgClient, QueryResult};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use retry::{BackoffStrategy, RetryConfig};

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "60.0";

/// User-Agent string for the client.
pub const USER_AGENT: &str = concat!("sfmx/", env!("CARGO_PKG_VERSION"));

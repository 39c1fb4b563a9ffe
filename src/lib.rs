//! # sfmx
//!
//! Salesforce object and field metadata exporter for Rust.
//!
//! Exports an org's object/field metadata into CSV, optionally filtered
//! down to one user's effective permissions (Profile + assigned
//! permission sets, OR-aggregated).
//!
//! ## Crates
//!
//! - **sfmx-client** - Authenticated HTTP client: retry, SOQL execution, pagination
//! - **sfmx-export** - Export pipeline: permission aggregation, object filtering,
//!   field flattening, CSV output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfmx::client::OrgClient;
//! use sfmx::export::{ExportOptions, MetadataExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrgClient::new(
//!         std::env::var("SF_INSTANCE_URL")?,
//!         std::env::var("SF_ACCESS_TOKEN")?,
//!     )?;
//!
//!     let outcome = MetadataExporter::new(client, ExportOptions::default())
//!         .run()
//!         .await?;
//!
//!     std::fs::write(&outcome.filename, &outcome.csv)?;
//!     println!("wrote {} field rows to {}", outcome.stats.fields, outcome.filename);
//!     Ok(())
//! }
//! ```

// Re-export both crates for convenient access
pub use sfmx_client as client;
pub use sfmx_export as export;

//! # sfmx-export
//!
//! Salesforce object/field metadata export pipeline.
//!
//! The pipeline turns an org's object catalog into a flat CSV of field
//! metadata, optionally filtered down to what one user can actually see:
//!
//! 1. **Permission aggregation** — resolve a username to effective
//!    object- and field-level access by OR-folding every assigned
//!    permission set plus the one backing the user's Profile.
//! 2. **Object filtering** — ordered stages: system-object exclusion,
//!    object-type inclusion, and fail-closed permission filtering.
//! 3. **Field flattening** — describe each surviving object, drop fields
//!    the user explicitly cannot read, and emit one record per field with
//!    option-dependent column groups.
//! 4. **CSV serialization** — explicit option-derived header, RFC4180
//!    quoting.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfmx_client::OrgClient;
//! use sfmx_export::{ExportOptions, MetadataExporter};
//!
//! let client = OrgClient::new(instance_url, access_token)?;
//! let outcome = MetadataExporter::new(client, ExportOptions::for_user("jdoe@example.com"))
//!     .run()
//!     .await?;
//! println!("{} rows -> {}", outcome.stats.fields, outcome.filename);
//! ```

pub mod describe;
mod error;
mod exporter;
pub mod filter;
pub mod flatten;
mod options;
pub mod permissions;
mod progress;
pub mod serializer;

pub use error::{ExportError, Result};
pub use exporter::{output_filename, ExportOutcome, MetadataExporter};
pub use options::{ApiSurface, ExportOptions, SystemObjectFilters};
pub use permissions::{
    resolve_user_permissions, FieldAccess, ObjectAccess, UserPermissions, MAX_IDS_PER_QUERY,
};
pub use progress::{ExportStats, NoProgress, ProgressRange, ProgressSink};

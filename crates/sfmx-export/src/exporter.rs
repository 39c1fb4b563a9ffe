//! Export run orchestration.
//!
//! One `MetadataExporter` owns one run: permission resolution (when
//! requested), catalog listing, the filter pipeline, the sequential
//! describe loop, and CSV generation. Describe calls run one object at a
//! time so progress stays linear and API-call order deterministic.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use sfmx_client::OrgClient;

use crate::describe;
use crate::error::{ExportError, Result};
use crate::filter::{filter_objects, FilterOutcome};
use crate::flatten::{self, FieldRecord, PermissionContext};
use crate::options::ExportOptions;
use crate::permissions::{resolve_user_permissions, UserPermissions};
use crate::progress::{ExportStats, NoProgress, ProgressRange, ProgressReporter, ProgressSink};
use crate::serializer;

/// Final artifact of a run.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// The CSV text.
    pub csv: String,
    /// Suggested output filename.
    pub filename: String,
    /// Run counters.
    pub stats: ExportStats,
}

/// Orchestrates one export run.
///
/// # Example
///
/// ```rust,ignore
/// use sfmx_client::OrgClient;
/// use sfmx_export::{ExportOptions, MetadataExporter};
///
/// let client = OrgClient::new(instance_url, token)?;
/// let outcome = MetadataExporter::new(client, ExportOptions::default())
///     .with_progress(|text: &str, percent: u8, _stats: &_| {
///         eprintln!("[{percent:>3}%] {text}");
///     })
///     .run()
///     .await?;
/// std::fs::write(&outcome.filename, &outcome.csv)?;
/// ```
pub struct MetadataExporter {
    client: OrgClient,
    options: ExportOptions,
    progress: Arc<dyn ProgressSink>,
    describe_range: ProgressRange,
}

impl MetadataExporter {
    /// Create an exporter for one run.
    pub fn new(client: OrgClient, options: ExportOptions) -> Self {
        Self {
            client,
            options,
            progress: Arc::new(NoProgress),
            describe_range: ProgressRange::default(),
        }
    }

    /// Attach a progress sink.
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(sink);
        self
    }

    /// Override the slice of overall progress the describe loop occupies.
    pub fn with_describe_range(mut self, start: u8, end: u8) -> Self {
        self.describe_range = ProgressRange { start, end };
        self
    }

    /// Execute the run and return the CSV artifact.
    pub async fn run(&self) -> Result<ExportOutcome> {
        self.options.validate()?;

        let reporter = ProgressReporter::new(self.progress.as_ref());
        let mut stats = ExportStats::default();

        let permissions: Option<UserPermissions> = match self.options.permission_filtering() {
            Some(username) => {
                reporter.report(&format!("Looking up user: {username}..."), 3, &stats);
                let permissions = resolve_user_permissions(&self.client, username).await?;
                reporter.report(
                    &format!("Permissions loaded for {username}. Fetching objects..."),
                    self.describe_range.start,
                    &stats,
                );
                Some(permissions)
            }
            None => {
                reporter.report("Fetching all objects...", 5, &stats);
                None
            }
        };

        let catalog = describe::list_sobjects(&self.client, self.options.api_surface)
            .await
            .map_err(ExportError::from)?;

        let FilterOutcome {
            objects,
            total_before,
            filtered_system_objects,
            filtered_by_permissions,
        } = filter_objects(catalog, &self.options, permissions.as_ref());

        stats.objects = objects.len();
        stats.filtered_system_objects = filtered_system_objects;
        stats.filtered_by_permissions = filtered_by_permissions;
        info!(
            total_before,
            kept = objects.len(),
            filtered_system_objects,
            filtered_by_permissions,
            "object catalog filtered"
        );
        reporter.report(
            &format!("Found {} objects. Fetching field details...", objects.len()),
            self.describe_range.start,
            &stats,
        );

        let columns = flatten::columns(&self.options);
        let mut rows: Vec<Vec<String>> = Vec::new();
        let total = objects.len();

        for (index, object) in objects.iter().enumerate() {
            reporter.report(
                &format!("Processing {} of {}: {}", index + 1, total, object.name),
                self.describe_range.scale(index, total),
                &stats,
            );

            let described = match describe::describe_sobject(
                &self.client,
                self.options.api_surface,
                &object.name,
            )
            .await
            {
                Ok(described) => described,
                Err(err) if err.is_auth_error() => return Err(ExportError::from(err)),
                Err(err) => {
                    warn!(object = %object.name, error = %err, "describe failed, skipping object");
                    continue;
                }
            };

            for field in &described.fields {
                let field_access = permissions
                    .as_ref()
                    .and_then(|p| p.field(&object.name, &field.name))
                    .copied();

                if permissions.is_some() && !flatten::field_visible(field_access.as_ref()) {
                    stats.filtered_fields += 1;
                    continue;
                }

                let context = permissions.as_ref().map(|p| PermissionContext {
                    object_access: p.object(&object.name).copied(),
                    field_access,
                    username: p.user.username.clone(),
                });

                let record = FieldRecord::build(object, field, &self.options, context);
                rows.push(record.cells(&columns));
                stats.fields += 1;
            }
        }

        reporter.report("Generating CSV file...", 95, &stats);
        let csv = serializer::to_csv(&columns, &rows)?;

        let filename = output_filename(
            permissions.as_ref().map(|p| p.user.username.as_str()),
            Utc::now().date_naive(),
        );

        info!(
            objects = stats.objects,
            fields = stats.fields,
            filtered_fields = stats.filtered_fields,
            %filename,
            "export complete"
        );
        reporter.complete("Export complete", &stats);

        Ok(ExportOutcome {
            csv,
            filename,
            stats,
        })
    }
}

/// Build the suggested output filename.
///
/// `salesforce_metadata_<date>` plus, when user-filtered, the username's
/// local part with anything outside `[A-Za-z0-9]` replaced by `_`.
pub fn output_filename(username: Option<&str>, date: chrono::NaiveDate) -> String {
    let mut filename = format!("salesforce_metadata_{}", date.format("%Y-%m-%d"));
    if let Some(username) = username {
        let local_part = username.split('@').next().unwrap_or(username);
        let sanitized: String = local_part
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        filename.push('_');
        filename.push_str(&sanitized);
    }
    filename.push_str(".csv");
    filename
}

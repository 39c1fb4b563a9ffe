//! Export an org's object/field metadata to a CSV file.
//!
//! ```sh
//! export SF_INSTANCE_URL='https://myorg.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! # optional: filter by one user's effective permissions
//! export SF_EXPORT_USERNAME='jdoe@example.com'
//! cargo run --bin export-metadata
//! ```

use sfmx_client::OrgClient;
use sfmx_export::{ExportOptions, ExportStats, MetadataExporter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let instance_url = require_env("SF_INSTANCE_URL");
    let access_token = require_env("SF_ACCESS_TOKEN");

    let client = OrgClient::new(instance_url, access_token).unwrap_or_else(|e| {
        eprintln!("Error: invalid client configuration: {e}");
        std::process::exit(1);
    });

    let options = match std::env::var("SF_EXPORT_USERNAME") {
        Ok(username) if !username.is_empty() => ExportOptions::for_user(username),
        _ => ExportOptions::default(),
    };

    let outcome = MetadataExporter::new(client, options)
        .with_progress(|text: &str, percent: u8, _stats: &ExportStats| {
            eprintln!("[{percent:>3}%] {text}");
        })
        .run()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: export failed: {e}");
            std::process::exit(1);
        });

    if let Err(e) = std::fs::write(&outcome.filename, &outcome.csv) {
        eprintln!("Error: could not write {}: {e}", outcome.filename);
        std::process::exit(1);
    }

    println!(
        "Exported {} fields across {} objects to {}",
        outcome.stats.fields, outcome.stats.objects, outcome.filename
    );
    if outcome.stats.filtered_system_objects > 0 || outcome.stats.filtered_by_permissions > 0 {
        println!(
            "Filtered: {} system objects, {} objects by permissions, {} fields by permissions",
            outcome.stats.filtered_system_objects,
            outcome.stats.filtered_by_permissions,
            outcome.stats.filtered_fields
        );
    }
}

fn require_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        eprintln!("Error: {name} environment variable is not set.");
        std::process::exit(1);
    })
}

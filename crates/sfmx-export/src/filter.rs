//! Object catalog filtering.
//!
//! Three stages in fixed order, each independently toggleable:
//! system-object exclusion, object-type inclusion, and permission-based
//! exclusion. The whole pipeline is a pure function of its inputs.

use tracing::{debug, info};

use crate::describe::SObjectBasicInfo;
use crate::options::{ExportOptions, SystemObjectFilters};
use crate::permissions::UserPermissions;

/// Objects excluded whenever the system-filter master switch is on,
/// independent of the sub-filter flags.
const ALWAYS_EXCLUDED: [&str; 10] = [
    "CombinedAttachment",
    "ContentDocumentLink",
    "AttachedContentDocument",
    "NoteAndAttachment",
    "UserRecordAccess",
    "RecentlyViewed",
    "ProcessInstance",
    "ProcessInstanceHistory",
    "ProcessInstanceStep",
    "ProcessInstanceWorkitem",
];

/// Name prefixes excluded whenever the master switch is on.
const SYSTEM_PREFIXES: [&str; 3] = ["Dashboard", "Report", "Folder"];

/// Feed objects that don't carry the `Feed` suffix.
const FEED_OBJECTS: [&str; 3] = ["FeedItem", "FeedComment", "FeedTrackedChange"];

/// History-style objects that don't carry the `History` suffix.
const HISTORY_OBJECTS: [&str; 2] = ["ActivityHistory", "OpenActivity"];

/// Whether an object name matches the enabled system-object rules.
///
/// Returns false unconditionally when the master switch is off.
pub fn is_system_object(name: &str, filters: &SystemObjectFilters) -> bool {
    if !filters.enabled {
        return false;
    }

    if filters.filter_share && name.ends_with("Share") {
        return true;
    }
    if filters.filter_feed && (name.ends_with("Feed") || FEED_OBJECTS.contains(&name)) {
        return true;
    }
    if filters.filter_history && (name.ends_with("History") || HISTORY_OBJECTS.contains(&name)) {
        return true;
    }
    if filters.filter_change_events && name.ends_with("ChangeEvent") {
        return true;
    }
    if filters.filter_platform_events && name.ends_with("__e") {
        return true;
    }

    SYSTEM_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        || ALWAYS_EXCLUDED.contains(&name)
}

/// Result of the filter pipeline: the surviving objects plus the
/// per-stage removal counters needed for progress reporting.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Objects surviving every enabled stage, in catalog order.
    pub objects: Vec<SObjectBasicInfo>,
    /// Catalog size before any stage ran.
    pub total_before: usize,
    /// Removed by the system-object stage.
    pub filtered_system_objects: usize,
    /// Removed by the permission stage.
    pub filtered_by_permissions: usize,
}

/// Apply the filter stages to the catalog in order.
///
/// The type-inclusion stage is uncounted; the system-object and
/// permission stages each report count-before minus count-after. The
/// permission stage is fail-closed: objects with no permission entry are
/// excluded, not included by default.
pub fn filter_objects(
    catalog: Vec<SObjectBasicInfo>,
    options: &ExportOptions,
    permissions: Option<&UserPermissions>,
) -> FilterOutcome {
    let total_before = catalog.len();
    let mut objects = catalog;

    let mut filtered_system_objects = 0;
    if options.system_object_filters.enabled {
        let before = objects.len();
        objects.retain(|obj| {
            let system = is_system_object(&obj.name, &options.system_object_filters);
            if system {
                debug!(object = %obj.name, "excluding system object");
            }
            !system
        });
        filtered_system_objects = before - objects.len();
        info!(removed = filtered_system_objects, "system-object filter applied");
    }

    if !(options.include_standard && options.include_custom) {
        objects.retain(|obj| {
            (options.include_custom && obj.custom) || (options.include_standard && !obj.custom)
        });
    }

    let mut filtered_by_permissions = 0;
    if let Some(permissions) = permissions {
        let before = objects.len();
        objects.retain(|obj| match permissions.object(&obj.name) {
            Some(access) if access.read => true,
            Some(_) => {
                debug!(object = %obj.name, "no read access, excluding");
                false
            }
            None => {
                debug!(object = %obj.name, "no permission entry, excluding");
                false
            }
        });
        filtered_by_permissions = before - objects.len();
        info!(
            removed = filtered_by_permissions,
            kept = objects.len(),
            "permission filter applied"
        );
    }

    FilterOutcome {
        objects,
        total_before,
        filtered_system_objects,
        filtered_by_permissions,
    }
}

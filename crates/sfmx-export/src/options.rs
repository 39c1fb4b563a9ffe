//! Export run configuration.

use crate::error::{ExportError, Result};

pub use sfmx_client::ApiSurface;

/// Toggles for excluding system-generated objects from the catalog.
///
/// `enabled` is the master switch: when false, every sub-filter is
/// short-circuited and the catalog passes through untouched. When true,
/// a fixed set of framework objects (Dashboard*/Report*/Folder* and the
/// always-exclude list) is dropped regardless of the sub-filter flags.
#[derive(Debug, Clone)]
pub struct SystemObjectFilters {
    /// Master switch for all system-object filtering.
    pub enabled: bool,
    /// Exclude sharing objects (`*Share`).
    pub filter_share: bool,
    /// Exclude Chatter feed objects (`*Feed`, FeedItem, FeedComment, ...).
    pub filter_feed: bool,
    /// Exclude field-history objects (`*History`, ActivityHistory, ...).
    pub filter_history: bool,
    /// Exclude change data capture objects (`*ChangeEvent`).
    pub filter_change_events: bool,
    /// Exclude platform events (`*__e`).
    pub filter_platform_events: bool,
}

impl Default for SystemObjectFilters {
    fn default() -> Self {
        Self {
            enabled: true,
            filter_share: true,
            filter_feed: true,
            filter_history: true,
            filter_change_events: true,
            filter_platform_events: true,
        }
    }
}

impl SystemObjectFilters {
    /// All filtering off; the catalog passes through unchanged.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include standard objects.
    pub include_standard: bool,
    /// Include custom objects.
    pub include_custom: bool,
    /// Which data API surface to list and describe objects on.
    pub api_surface: ApiSurface,
    /// Emit the field-attribute column group (Required, Unique, ...).
    pub include_attributes: bool,
    /// Emit the relationship column group (ReferenceTo, ...).
    pub include_relationships: bool,
    /// Emit the picklist column group (PicklistValues, RestrictedPicklist).
    pub include_picklist: bool,
    /// Filter objects and fields by one user's effective permissions.
    pub filter_by_user: bool,
    /// Username to resolve when `filter_by_user` is set.
    pub username: Option<String>,
    /// System-object exclusion toggles.
    pub system_object_filters: SystemObjectFilters,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_standard: true,
            include_custom: true,
            api_surface: ApiSurface::Rest,
            include_attributes: true,
            include_relationships: true,
            include_picklist: true,
            filter_by_user: false,
            username: None,
            system_object_filters: SystemObjectFilters::default(),
        }
    }
}

impl ExportOptions {
    /// Default options with permission filtering for the given user.
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            filter_by_user: true,
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// The username to filter by, when permission filtering is active.
    pub fn permission_filtering(&self) -> Option<&str> {
        if !self.filter_by_user {
            return None;
        }
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    /// Reject inconsistent option combinations before any API call.
    pub fn validate(&self) -> Result<()> {
        if self.filter_by_user && self.permission_filtering().is_none() {
            return Err(ExportError::InvalidOptions(
                "permission filtering requested without a username".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_everything() {
        let options = ExportOptions::default();
        assert!(options.include_standard);
        assert!(options.include_custom);
        assert!(options.include_attributes);
        assert!(options.include_relationships);
        assert!(options.include_picklist);
        assert!(!options.filter_by_user);
        assert!(options.system_object_filters.enabled);
        assert_eq!(options.api_surface, ApiSurface::Rest);
    }

    #[test]
    fn test_for_user_activates_permission_filtering() {
        let options = ExportOptions::for_user("jdoe@example.com");
        assert_eq!(options.permission_filtering(), Some("jdoe@example.com"));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_filter_by_user_without_username_rejected() {
        let options = ExportOptions {
            filter_by_user: true,
            username: None,
            ..ExportOptions::default()
        };
        assert!(options.permission_filtering().is_none());
        assert!(matches!(
            options.validate(),
            Err(ExportError::InvalidOptions(_))
        ));

        let options = ExportOptions {
            filter_by_user: true,
            username: Some(String::new()),
            ..ExportOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_username_ignored_without_filter_flag() {
        let options = ExportOptions {
            filter_by_user: false,
            username: Some("jdoe@example.com".into()),
            ..ExportOptions::default()
        };
        assert_eq!(options.permission_filtering(), None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_disabled_system_filters() {
        let filters = SystemObjectFilters::disabled();
        assert!(!filters.enabled);
        assert!(filters.filter_share);
    }
}

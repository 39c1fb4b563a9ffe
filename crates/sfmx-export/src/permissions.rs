//! Effective-permission aggregation for one user.
//!
//! A user's effective access is the OR of every permission set assigned to
//! them plus the permission set implicitly backing their Profile. The fold
//! over permission rows is split out from the fetching so the aggregation
//! semantics are testable without a network.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use tracing::{debug, info, warn};

use sfmx_client::security::soql;
use sfmx_client::OrgClient;

use crate::error::{ExportError, Result};

/// Maximum ids per `IN (...)` list, bounded to respect query-length limits.
pub const MAX_IDS_PER_QUERY: usize = 50;

/// The resolved export user. Immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
}

/// Object-level access, OR-aggregated across permission sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectAccess {
    pub read: bool,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
    pub view_all: bool,
    pub modify_all: bool,
}

/// Field-level access, OR-aggregated across permission sets.
///
/// Absence of an entry for a field means no explicit field-level row
/// exists, which implies inheriting the object-level access — it does
/// not mean "no access".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldAccess {
    pub read: bool,
    pub edit: bool,
}

/// One ObjectPermissions row as returned by the query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectPermissionRow {
    #[serde(rename = "SobjectType")]
    pub sobject_type: String,
    #[serde(rename = "PermissionsRead", default)]
    pub read: bool,
    #[serde(rename = "PermissionsCreate", default)]
    pub create: bool,
    #[serde(rename = "PermissionsEdit", default)]
    pub edit: bool,
    #[serde(rename = "PermissionsDelete", default)]
    pub delete: bool,
    #[serde(rename = "PermissionsViewAllRecords", default)]
    pub view_all: bool,
    #[serde(rename = "PermissionsModifyAllRecords", default)]
    pub modify_all: bool,
}

/// One FieldPermissions row as returned by the query endpoint.
///
/// `Field` arrives qualified as `Object.Field`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldPermissionRow {
    #[serde(rename = "SobjectType")]
    pub sobject_type: String,
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "PermissionsRead", default)]
    pub read: bool,
    #[serde(rename = "PermissionsEdit", default)]
    pub edit: bool,
}

/// Aggregated permissions for one user. Built exactly once per run and
/// read-only afterward.
#[derive(Debug, Clone)]
pub struct UserPermissions {
    pub user: User,
    object_permissions: HashMap<String, ObjectAccess>,
    field_permissions: HashMap<(String, String), FieldAccess>,
}

impl UserPermissions {
    /// Assemble from pre-aggregated maps.
    pub fn new(
        user: User,
        object_permissions: HashMap<String, ObjectAccess>,
        field_permissions: HashMap<(String, String), FieldAccess>,
    ) -> Self {
        Self {
            user,
            object_permissions,
            field_permissions,
        }
    }

    /// Object-level access for an object API name, if any row granted it.
    pub fn object(&self, name: &str) -> Option<&ObjectAccess> {
        self.object_permissions.get(name)
    }

    /// Explicit field-level access for (object, field), if a row exists.
    pub fn field(&self, object: &str, field: &str) -> Option<&FieldAccess> {
        self.field_permissions
            .get(&(object.to_string(), field.to_string()))
    }

    /// Number of objects with at least one permission row.
    pub fn object_count(&self) -> usize {
        self.object_permissions.len()
    }
}

/// Fold object-permission rows into the access map.
///
/// Monotonic OR: once any contributing row grants a permission it stays
/// granted regardless of later rows.
pub fn merge_object_permission_rows(
    map: &mut HashMap<String, ObjectAccess>,
    rows: impl IntoIterator<Item = ObjectPermissionRow>,
) {
    for row in rows {
        let access = map.entry(row.sobject_type).or_default();
        access.read |= row.read;
        access.create |= row.create;
        access.edit |= row.edit;
        access.delete |= row.delete;
        access.view_all |= row.view_all;
        access.modify_all |= row.modify_all;
    }
}

/// Fold field-permission rows into the access map, normalizing the
/// `Object.Field` wire format down to a bare field name key.
pub fn merge_field_permission_rows(
    map: &mut HashMap<(String, String), FieldAccess>,
    rows: impl IntoIterator<Item = FieldPermissionRow>,
) {
    for row in rows {
        let field_name = row
            .field
            .strip_prefix(&format!("{}.", row.sobject_type))
            .unwrap_or(&row.field)
            .to_string();
        let access = map.entry((row.sobject_type, field_name)).or_default();
        access.read |= row.read;
        access.edit |= row.edit;
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "ProfileId")]
    profile_id: Option<String>,
    #[serde(rename = "Profile")]
    profile: Option<ProfileName>,
}

#[derive(Debug, Deserialize)]
struct ProfileName {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionSetAssignmentRow {
    #[serde(rename = "PermissionSetId")]
    permission_set_id: String,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[serde(rename = "Id")]
    id: String,
}

/// Resolve a user and aggregate their effective permissions.
///
/// Fails with [`ExportError::UserNotFound`] when no User matches the
/// username exactly. Any query failure here is fatal to the run: the
/// permission maps must be complete for fail-closed filtering to mean
/// anything.
pub async fn resolve_user_permissions(
    client: &OrgClient,
    username: &str,
) -> Result<UserPermissions> {
    let user = resolve_user(client, username).await?;
    let permission_set_ids = collect_permission_set_ids(client, &user).await?;
    debug!(count = permission_set_ids.len(), "effective permission set ids");

    let mut object_permissions = HashMap::new();
    let mut field_permissions = HashMap::new();

    if permission_set_ids.is_empty() {
        warn!(
            username = %user.username,
            "user has no permission sets; every object will be excluded"
        );
    } else {
        for chunk in permission_set_ids.chunks(MAX_IDS_PER_QUERY) {
            let rows: Vec<ObjectPermissionRow> =
                client.query_all(&object_permissions_soql(chunk)).await?;
            merge_object_permission_rows(&mut object_permissions, rows);
        }
        for chunk in permission_set_ids.chunks(MAX_IDS_PER_QUERY) {
            let rows: Vec<FieldPermissionRow> =
                client.query_all(&field_permissions_soql(chunk)).await?;
            merge_field_permission_rows(&mut field_permissions, rows);
        }
    }

    info!(
        username = %user.username,
        objects = object_permissions.len(),
        fields = field_permissions.len(),
        "aggregated user permissions"
    );

    Ok(UserPermissions::new(
        user,
        object_permissions,
        field_permissions,
    ))
}

async fn resolve_user(client: &OrgClient, username: &str) -> Result<User> {
    let query = format!(
        "SELECT Id, Username, ProfileId, Profile.Name FROM User WHERE Username = '{}' LIMIT 1",
        soql::escape_string(username)
    );
    let mut rows: Vec<UserRow> = client.query_all(&query).await?;

    let Some(row) = rows.pop() else {
        return Err(ExportError::UserNotFound {
            username: username.to_string(),
        });
    };

    let user = User {
        id: row.id,
        username: row.username,
        profile_id: row.profile_id,
        profile_name: row.profile.and_then(|p| p.name),
    };
    info!(user_id = %user.id, profile = ?user.profile_name, "resolved export user");
    Ok(user)
}

/// Assigned permission sets plus the one backing the user's Profile,
/// deduplicated and in stable order.
async fn collect_permission_set_ids(client: &OrgClient, user: &User) -> Result<Vec<String>> {
    let query = format!(
        "SELECT PermissionSetId FROM PermissionSetAssignment WHERE AssigneeId = '{}'",
        soql::escape_string(&user.id)
    );
    let assignments: Vec<PermissionSetAssignmentRow> = client.query_all(&query).await?;

    let mut ids: BTreeSet<String> = assignments
        .into_iter()
        .map(|a| a.permission_set_id)
        .collect();

    if let Some(profile_id) = &user.profile_id {
        let query = format!(
            "SELECT Id FROM PermissionSet WHERE ProfileId = '{}'",
            soql::escape_string(profile_id)
        );
        let sets: Vec<IdRow> = client.query_all(&query).await?;
        if let Some(profile_set) = sets.into_iter().next() {
            ids.insert(profile_set.id);
        }
    }

    Ok(ids.into_iter().collect())
}

fn id_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("'{}'", soql::escape_string(id)))
        .collect::<Vec<_>>()
        .join(",")
}

fn object_permissions_soql(ids: &[String]) -> String {
    format!(
        "SELECT SobjectType, PermissionsRead, PermissionsCreate, PermissionsEdit, \
         PermissionsDelete, PermissionsViewAllRecords, PermissionsModifyAllRecords \
         FROM ObjectPermissions WHERE ParentId IN ({})",
        id_list(ids)
    )
}

fn field_permissions_soql(ids: &[String]) -> String {
    format!(
        "SELECT SobjectType, Field, PermissionsRead, PermissionsEdit \
         FROM FieldPermissions WHERE ParentId IN ({})",
        id_list(ids)
    )
}

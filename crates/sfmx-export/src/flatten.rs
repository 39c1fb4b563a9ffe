//! Flattening described fields into tabular records.
//!
//! A [`FieldRecord`] keeps the option-dependent column groups as typed
//! optionals and is materialized into ordered string cells only against
//! the explicit column list from [`columns`]. Deriving the header from
//! the options instead of the first record means rows with absent groups
//! serialize as empty cells and can never misalign.

use crate::describe::{FieldDescribe, SObjectBasicInfo};
use crate::options::ExportOptions;
use crate::permissions::{FieldAccess, ObjectAccess};

const CORE_COLUMNS: [&str; 9] = [
    "ObjectName",
    "ObjectLabel",
    "IsCustomObject",
    "FieldName",
    "FieldLabel",
    "Type",
    "Length",
    "Precision",
    "Scale",
];

const ATTRIBUTE_COLUMNS: [&str; 9] = [
    "Required",
    "Unique",
    "ExternalId",
    "Createable",
    "Updateable",
    "Filterable",
    "Sortable",
    "Calculated",
    "DefaultValue",
];

const RELATIONSHIP_COLUMNS: [&str; 3] = ["ReferenceTo", "RelationshipName", "CascadeDelete"];

const PICKLIST_COLUMNS: [&str; 2] = ["PicklistValues", "RestrictedPicklist"];

const PERMISSION_COLUMNS: [&str; 9] = [
    "UserCanRead",
    "UserCanEdit",
    "ObjRead",
    "ObjCreate",
    "ObjEdit",
    "ObjDelete",
    "ObjViewAll",
    "ObjModifyAll",
    "FilteredForUser",
];

/// The full column list for the given options, in output order.
pub fn columns(options: &ExportOptions) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = CORE_COLUMNS.to_vec();
    if options.include_attributes {
        columns.extend(ATTRIBUTE_COLUMNS);
    }
    if options.include_relationships {
        columns.extend(RELATIONSHIP_COLUMNS);
    }
    if options.include_picklist {
        columns.extend(PICKLIST_COLUMNS);
    }
    if options.permission_filtering().is_some() {
        columns.extend(PERMISSION_COLUMNS);
    }
    columns
}

/// Whether a field survives field-level permission filtering.
///
/// An explicit row with `read == false` drops the field; the absence of
/// a row keeps it (the field inherits the object-level read that already
/// admitted the object).
pub fn field_visible(field_access: Option<&FieldAccess>) -> bool {
    field_access.map_or(true, |access| access.read)
}

/// Permission context for one field's record.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub object_access: Option<ObjectAccess>,
    pub field_access: Option<FieldAccess>,
    pub username: String,
}

/// One output row, column groups kept optional until serialization.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    core: CoreColumns,
    attributes: Option<AttributeColumns>,
    relationships: Option<RelationshipColumns>,
    picklist: Option<PicklistColumns>,
    permissions: Option<PermissionColumns>,
}

#[derive(Debug, Clone)]
struct CoreColumns {
    object_name: String,
    object_label: String,
    custom_object: bool,
    field_name: String,
    field_label: String,
    field_type: String,
    length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
}

#[derive(Debug, Clone)]
struct AttributeColumns {
    required: bool,
    unique: bool,
    external_id: bool,
    createable: bool,
    updateable: bool,
    filterable: bool,
    sortable: bool,
    calculated: bool,
    default_value: String,
}

#[derive(Debug, Clone)]
struct RelationshipColumns {
    reference_to: String,
    relationship_name: String,
    cascade_delete: bool,
}

#[derive(Debug, Clone)]
struct PicklistColumns {
    values: String,
    restricted: bool,
}

#[derive(Debug, Clone)]
struct PermissionColumns {
    can_read: bool,
    can_edit: bool,
    object: ObjectAccess,
    username: String,
}

impl FieldRecord {
    /// Build a record for one field of one object.
    pub fn build(
        object: &SObjectBasicInfo,
        field: &FieldDescribe,
        options: &ExportOptions,
        permissions: Option<PermissionContext>,
    ) -> Self {
        let core = CoreColumns {
            object_name: object.name.clone(),
            object_label: object.label.clone(),
            custom_object: object.custom,
            field_name: field.name.clone(),
            field_label: field.label.clone(),
            field_type: field.field_type.clone(),
            length: field.length,
            precision: field.precision,
            scale: field.scale,
        };

        let attributes = options.include_attributes.then(|| AttributeColumns {
            required: !field.nillable && field.defaulted_on_create == Some(false),
            unique: field.unique,
            external_id: field.external_id,
            createable: field.createable,
            updateable: field.updateable,
            filterable: field.filterable,
            sortable: field.sortable,
            calculated: field.calculated,
            default_value: default_value_cell(field.default_value.as_ref()),
        });

        let relationships = options.include_relationships.then(|| RelationshipColumns {
            reference_to: field
                .reference_to
                .as_ref()
                .map(|targets| targets.join(", "))
                .unwrap_or_default(),
            relationship_name: field.relationship_name.clone().unwrap_or_default(),
            cascade_delete: field.cascade_delete.unwrap_or(false),
        });

        let picklist = (options.include_picklist && is_picklist_type(&field.field_type))
            .then(|| PicklistColumns {
                values: field
                    .picklist_values
                    .as_ref()
                    .map(|values| {
                        values
                            .iter()
                            .map(|pv| pv.value.as_str())
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
                    .unwrap_or_default(),
                restricted: field.restricted_picklist.unwrap_or(false),
            });

        let permissions = permissions.map(|ctx| {
            let object_access = ctx.object_access.unwrap_or_default();
            PermissionColumns {
                can_read: ctx
                    .field_access
                    .map(|f| f.read)
                    .unwrap_or(object_access.read),
                can_edit: ctx
                    .field_access
                    .map(|f| f.edit)
                    .unwrap_or(object_access.edit),
                object: object_access,
                username: ctx.username,
            }
        });

        Self {
            core,
            attributes,
            relationships,
            picklist,
            permissions,
        }
    }

    /// Materialize the record into cells ordered by `columns`.
    ///
    /// Columns whose group is absent on this record render as empty
    /// strings.
    pub fn cells(&self, columns: &[&'static str]) -> Vec<String> {
        columns.iter().map(|column| self.cell(column)).collect()
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "ObjectName" => self.core.object_name.clone(),
            "ObjectLabel" => self.core.object_label.clone(),
            "IsCustomObject" => yes_no(self.core.custom_object),
            "FieldName" => self.core.field_name.clone(),
            "FieldLabel" => self.core.field_label.clone(),
            "Type" => self.core.field_type.clone(),
            "Length" => numeric_cell(self.core.length),
            "Precision" => numeric_cell(self.core.precision),
            "Scale" => numeric_cell(self.core.scale),

            "Required" => self.attr(|a| yes_no(a.required)),
            "Unique" => self.attr(|a| yes_no(a.unique)),
            "ExternalId" => self.attr(|a| yes_no(a.external_id)),
            "Createable" => self.attr(|a| yes_no(a.createable)),
            "Updateable" => self.attr(|a| yes_no(a.updateable)),
            "Filterable" => self.attr(|a| yes_no(a.filterable)),
            "Sortable" => self.attr(|a| yes_no(a.sortable)),
            "Calculated" => self.attr(|a| yes_no(a.calculated)),
            "DefaultValue" => self.attr(|a| a.default_value.clone()),

            "ReferenceTo" => self.rel(|r| r.reference_to.clone()),
            "RelationshipName" => self.rel(|r| r.relationship_name.clone()),
            "CascadeDelete" => self.rel(|r| yes_no(r.cascade_delete)),

            "PicklistValues" => self.pick(|p| p.values.clone()),
            "RestrictedPicklist" => self.pick(|p| yes_no(p.restricted)),

            "UserCanRead" => self.perm(|p| yes_no(p.can_read)),
            "UserCanEdit" => self.perm(|p| yes_no(p.can_edit)),
            "ObjRead" => self.perm(|p| yes_no(p.object.read)),
            "ObjCreate" => self.perm(|p| yes_no(p.object.create)),
            "ObjEdit" => self.perm(|p| yes_no(p.object.edit)),
            "ObjDelete" => self.perm(|p| yes_no(p.object.delete)),
            "ObjViewAll" => self.perm(|p| yes_no(p.object.view_all)),
            "ObjModifyAll" => self.perm(|p| yes_no(p.object.modify_all)),
            "FilteredForUser" => self.perm(|p| p.username.clone()),

            _ => String::new(),
        }
    }

    fn attr(&self, f: impl Fn(&AttributeColumns) -> String) -> String {
        self.attributes.as_ref().map(f).unwrap_or_default()
    }

    fn rel(&self, f: impl Fn(&RelationshipColumns) -> String) -> String {
        self.relationships.as_ref().map(f).unwrap_or_default()
    }

    fn pick(&self, f: impl Fn(&PicklistColumns) -> String) -> String {
        self.picklist.as_ref().map(f).unwrap_or_default()
    }

    fn perm(&self, f: impl Fn(&PermissionColumns) -> String) -> String {
        self.permissions.as_ref().map(f).unwrap_or_default()
    }
}

fn is_picklist_type(field_type: &str) -> bool {
    field_type == "picklist" || field_type == "multipicklist"
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

/// Unset and zero both render empty, never "0".
fn numeric_cell(value: Option<i32>) -> String {
    match value {
        None | Some(0) => String::new(),
        Some(n) => n.to_string(),
    }
}

fn default_value_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

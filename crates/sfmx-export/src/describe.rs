//! Describe operations and wire types.
//!
//! Typed bindings for the two metadata introspection calls the pipeline
//! consumes: the global object catalog (`sobjects/`) and the per-object
//! field schema (`sobjects/{name}/describe/`), both available on the
//! standard and tooling surfaces.

use serde::{Deserialize, Serialize};

use sfmx_client::security::soql;
use sfmx_client::{ApiSurface, Error, ErrorKind, OrgClient};

/// Result of the describeGlobal operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    /// Character encoding (e.g., "UTF-8").
    pub encoding: Option<String>,

    /// Maximum batch size for composite operations.
    #[serde(rename = "maxBatchSize")]
    pub max_batch_size: Option<u32>,

    /// The org's object catalog.
    pub sobjects: Vec<SObjectBasicInfo>,
}

/// One catalog entry from describeGlobal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural")]
    pub label_plural: Option<String>,
    #[serde(rename = "keyPrefix")]
    pub key_prefix: Option<String>,
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
}

/// Per-object describe result.
///
/// Only the parts the flattener consumes are bound; the payload carries
/// far more.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    pub custom: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
}

/// Field schema from a describe call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,

    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,

    #[serde(default)]
    pub nillable: bool,
    #[serde(rename = "defaultedOnCreate")]
    pub defaulted_on_create: Option<bool>,
    #[serde(default)]
    pub unique: bool,
    #[serde(rename = "externalId", default)]
    pub external_id: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub calculated: bool,
    #[serde(rename = "defaultValue")]
    pub default_value: Option<serde_json::Value>,

    #[serde(rename = "referenceTo", default)]
    pub reference_to: Option<Vec<String>>,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,
    #[serde(rename = "cascadeDelete")]
    pub cascade_delete: Option<bool>,

    #[serde(rename = "picklistValues", default)]
    pub picklist_values: Option<Vec<PicklistValue>>,
    #[serde(rename = "restrictedPicklist")]
    pub restricted_picklist: Option<bool>,
}

/// Picklist entry for picklist fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PicklistValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: bool,
}

/// List the org's object catalog on the given surface.
pub async fn list_sobjects(
    client: &OrgClient,
    surface: ApiSurface,
) -> sfmx_client::Result<Vec<SObjectBasicInfo>> {
    let url = client.data_url(surface, "sobjects/");
    let result: DescribeGlobalResult = client.get_json(&url).await?;
    Ok(result.sobjects)
}

/// Describe one object's field schema on the given surface.
pub async fn describe_sobject(
    client: &OrgClient,
    surface: ApiSurface,
    name: &str,
) -> sfmx_client::Result<DescribeSObjectResult> {
    if !soql::is_safe_sobject_name(name) {
        return Err(Error::new(ErrorKind::Salesforce {
            error_code: "INVALID_SOBJECT".to_string(),
            message: format!("invalid SObject name: {name}"),
        }));
    }
    let url = client.data_url(surface, &format!("sobjects/{name}/describe/"));
    client.get_json(&url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_describe_global_deser() {
        let json = r#"{
            "encoding": "UTF-8",
            "maxBatchSize": 200,
            "sobjects": [{
                "name": "Account",
                "label": "Account",
                "labelPlural": "Accounts",
                "keyPrefix": "001",
                "custom": false,
                "queryable": true
            }]
        }"#;

        let result: DescribeGlobalResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.sobjects.len(), 1);
        assert_eq!(result.sobjects[0].name, "Account");
        assert!(!result.sobjects[0].custom);
    }

    #[test]
    fn test_field_describe_deser_sparse() {
        let json = r#"{
            "name": "Status__c",
            "label": "Status",
            "type": "picklist",
            "picklistValues": [
                {"value": "Open", "label": "Open", "active": true, "defaultValue": true},
                {"value": "Closed", "active": false}
            ],
            "restrictedPicklist": true
        }"#;

        let field: FieldDescribe = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, "picklist");
        assert!(!field.nillable);
        assert_eq!(field.length, None);
        let values = field.picklist_values.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].value, "Closed");
        assert_eq!(values[1].label, None);
    }

    #[test]
    fn test_field_describe_deser_reference() {
        let json = r#"{
            "name": "AccountId",
            "label": "Account ID",
            "type": "reference",
            "referenceTo": ["Account"],
            "relationshipName": "Account",
            "cascadeDelete": false,
            "nillable": true,
            "defaultedOnCreate": false
        }"#;

        let field: FieldDescribe = serde_json::from_str(json).unwrap();
        assert_eq!(field.reference_to.as_deref(), Some(&["Account".to_string()][..]));
        assert_eq!(field.relationship_name.as_deref(), Some("Account"));
        assert_eq!(field.defaulted_on_create, Some(false));
    }

    #[tokio::test]
    async fn test_list_sobjects_tooling_surface() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v60.0/tooling/sobjects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "encoding": "UTF-8",
                "maxBatchSize": 200,
                "sobjects": [
                    {"name": "ApexClass", "label": "Apex Class", "custom": false}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = OrgClient::new(mock_server.uri(), "token").unwrap();
        let catalog = list_sobjects(&client, ApiSurface::Tooling)
            .await
            .expect("listing should succeed");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "ApexClass");
    }

    #[tokio::test]
    async fn test_describe_sobject() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v60.0/sobjects/Account/describe/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Account",
                "label": "Account",
                "custom": false,
                "fields": [
                    {"name": "Name", "label": "Account Name", "type": "string", "length": 255}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = OrgClient::new(mock_server.uri(), "token").unwrap();
        let describe = describe_sobject(&client, ApiSurface::Rest, "Account")
            .await
            .expect("describe should succeed");
        assert_eq!(describe.fields.len(), 1);
        assert_eq!(describe.fields[0].length, Some(255));
    }

    #[tokio::test]
    async fn test_describe_rejects_unsafe_name() {
        let client = OrgClient::new("https://test.my.salesforce.com", "token").unwrap();
        let result = describe_sobject(&client, ApiSurface::Rest, "Bad'; DROP--").await;
        assert!(result.unwrap_err().to_string().contains("INVALID_SOBJECT"));
    }
}

//! End-to-end export runs against a mocked org.

use std::sync::{Arc, Mutex};

use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sfmx_client::{ClientConfig, OrgClient};
use sfmx_export::{
    ExportError, ExportOptions, ExportStats, MetadataExporter, ProgressSink, SystemObjectFilters,
};

const QUERY_PATH: &str = "/services/data/v60.0/query/";

fn test_client(uri: &str) -> OrgClient {
    let config = ClientConfig::builder().without_retry().build();
    OrgClient::with_config(uri, "test-token", config).expect("client should build")
}

fn query_body(records: serde_json::Value) -> serde_json::Value {
    let count = records.as_array().map(|a| a.len()).unwrap_or(0);
    serde_json::json!({
        "totalSize": count,
        "done": true,
        "records": records
    })
}

async fn mount_query(server: &MockServer, soql_fragment: &str, records: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("q", soql_fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_body(records)))
        .mount(server)
        .await;
}

async fn mount_catalog(server: &MockServer, sobjects: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/services/data/v60.0/sobjects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "encoding": "UTF-8",
            "maxBatchSize": 200,
            "sobjects": sobjects
        })))
        .mount(server)
        .await;
}

async fn mount_describe(server: &MockServer, object: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/services/data/v60.0/sobjects/{object}/describe/"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn account_describe() -> serde_json::Value {
    serde_json::json!({
        "name": "Account",
        "label": "Account",
        "custom": false,
        "fields": [
            {
                "name": "Name",
                "label": "Account Name",
                "type": "string",
                "length": 255,
                "nillable": false,
                "defaultedOnCreate": false,
                "createable": true,
                "updateable": true,
                "filterable": true,
                "sortable": true
            },
            {
                "name": "Industry",
                "label": "Industry",
                "type": "picklist",
                "nillable": true,
                "defaultedOnCreate": false,
                "restrictedPicklist": false,
                "picklistValues": [
                    {"value": "Banking", "label": "Banking", "active": true, "defaultValue": false},
                    {"value": "Energy", "label": "Energy", "active": true, "defaultValue": false}
                ]
            },
            {
                "name": "Secret__c",
                "label": "Secret",
                "type": "string",
                "length": 80,
                "nillable": true,
                "defaultedOnCreate": false
            }
        ]
    })
}

fn my_obj_describe() -> serde_json::Value {
    serde_json::json!({
        "name": "MyObj__c",
        "label": "My Object",
        "custom": true,
        "fields": [
            {
                "name": "Name",
                "label": "My Object Name",
                "type": "string",
                "length": 80,
                "nillable": false,
                "defaultedOnCreate": false
            }
        ]
    })
}

#[tokio::test]
async fn full_export_without_user_filter() {
    let server = MockServer::start().await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "Account", "label": "Account", "custom": false},
            {"name": "MyObj__c", "label": "My Object", "custom": true},
            {"name": "AccountShare", "label": "Account Share", "custom": false},
            {"name": "AccountChangeEvent", "label": "Account Change Event", "custom": false}
        ]),
    )
    .await;
    mount_describe(&server, "Account", account_describe()).await;
    mount_describe(&server, "MyObj__c", my_obj_describe()).await;

    let exporter = MetadataExporter::new(test_client(&server.uri()), ExportOptions::default());
    let outcome = exporter.run().await.expect("export should succeed");

    assert_eq!(outcome.stats.objects, 2);
    assert_eq!(outcome.stats.filtered_system_objects, 2);
    assert_eq!(outcome.stats.filtered_by_permissions, 0);
    assert_eq!(outcome.stats.fields, 4);

    let mut lines = outcome.csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("ObjectName,ObjectLabel,IsCustomObject,FieldName"));
    assert!(header.contains("PicklistValues"));
    assert!(!header.contains("UserCanRead"));

    let body: Vec<&str> = lines.collect();
    assert_eq!(body.len(), 4);
    assert!(body.iter().any(|l| l.contains("Banking; Energy")));
    assert!(body.iter().any(|l| l.starts_with("MyObj__c,My Object,Yes,Name")));
    assert!(!outcome.csv.contains("AccountShare"));

    assert!(outcome.filename.starts_with("salesforce_metadata_"));
    assert!(outcome.filename.ends_with(".csv"));
    assert!(!outcome.filename.contains('@'));
}

#[tokio::test]
async fn export_filtered_by_user_permissions() {
    let server = MockServer::start().await;

    mount_query(
        &server,
        "FROM User ",
        serde_json::json!([{
            "Id": "005000000000001",
            "Username": "jdoe@example.com",
            "ProfileId": "00e000000000001",
            "Profile": {"Name": "Standard User"}
        }]),
    )
    .await;
    mount_query(
        &server,
        "FROM PermissionSetAssignment",
        serde_json::json!([{"PermissionSetId": "0PS000000000001"}]),
    )
    .await;
    mount_query(
        &server,
        "FROM PermissionSet WHERE ProfileId",
        serde_json::json!([{"Id": "0PS000000000002"}]),
    )
    .await;
    mount_query(
        &server,
        "FROM ObjectPermissions",
        serde_json::json!([
            {
                "SobjectType": "Account",
                "PermissionsRead": true,
                "PermissionsCreate": false,
                "PermissionsEdit": true,
                "PermissionsDelete": false,
                "PermissionsViewAllRecords": false,
                "PermissionsModifyAllRecords": false
            }
        ]),
    )
    .await;
    mount_query(
        &server,
        "FROM FieldPermissions",
        serde_json::json!([
            {
                "SobjectType": "Account",
                "Field": "Account.Secret__c",
                "PermissionsRead": false,
                "PermissionsEdit": false
            }
        ]),
    )
    .await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "Account", "label": "Account", "custom": false},
            {"name": "MyObj__c", "label": "My Object", "custom": true}
        ]),
    )
    .await;
    mount_describe(&server, "Account", account_describe()).await;
    // MyObj__c has no permission entry; its describe must never be fetched.
    Mock::given(method("GET"))
        .and(path("/services/data/v60.0/sobjects/MyObj__c/describe/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(my_obj_describe()))
        .expect(0)
        .mount(&server)
        .await;

    let options = ExportOptions::for_user("jdoe@example.com");
    let exporter = MetadataExporter::new(test_client(&server.uri()), options);
    let outcome = exporter.run().await.expect("export should succeed");

    assert_eq!(outcome.stats.objects, 1);
    assert_eq!(outcome.stats.filtered_by_permissions, 1);
    assert_eq!(outcome.stats.filtered_fields, 1);
    assert_eq!(outcome.stats.fields, 2);

    let mut lines = outcome.csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.ends_with(
        "UserCanRead,UserCanEdit,ObjRead,ObjCreate,ObjEdit,ObjDelete,ObjViewAll,ObjModifyAll,FilteredForUser"
    ));

    let body: Vec<&str> = lines.collect();
    // Secret__c was explicitly unreadable and must be gone entirely.
    assert!(!outcome.csv.contains("Secret__c"));
    // Name has no explicit field row: it inherits object-level read/edit.
    let name_row = body
        .iter()
        .find(|l| l.contains(",Name,"))
        .expect("Name row present");
    assert!(name_row.contains("Yes,Yes,Yes,No,Yes,No,No,No,jdoe@example.com"));

    assert!(outcome.filename.ends_with("_jdoe.csv"));
}

#[tokio::test]
async fn unknown_user_aborts_before_object_listing() {
    let server = MockServer::start().await;

    mount_query(&server, "FROM User ", serde_json::json!([])).await;
    Mock::given(method("GET"))
        .and(path("/services/data/v60.0/sobjects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sobjects": []
        })))
        .expect(0)
        .mount(&server)
        .await;

    let options = ExportOptions::for_user("ghost@example.com");
    let exporter = MetadataExporter::new(test_client(&server.uri()), options);
    let err = exporter.run().await.unwrap_err();

    assert!(matches!(
        err,
        ExportError::UserNotFound { ref username } if username == "ghost@example.com"
    ));
}

#[tokio::test]
async fn describe_failure_skips_object_and_continues() {
    let server = MockServer::start().await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "Broken", "label": "Broken", "custom": false},
            {"name": "Account", "label": "Account", "custom": false}
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/services/data/v60.0/sobjects/Broken/describe/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_describe(&server, "Account", account_describe()).await;

    let options = ExportOptions {
        system_object_filters: SystemObjectFilters::disabled(),
        ..ExportOptions::default()
    };
    let exporter = MetadataExporter::new(test_client(&server.uri()), options);
    let outcome = exporter
        .run()
        .await
        .expect("run should survive one bad describe");

    assert_eq!(outcome.stats.objects, 2);
    assert_eq!(outcome.stats.fields, 3);
    assert!(!outcome.csv.contains("Broken"));
    assert!(outcome.csv.contains("Account"));
}

#[tokio::test]
async fn expired_session_fails_with_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v60.0/sobjects/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!([
            {"message": "Session expired or invalid", "errorCode": "INVALID_SESSION_ID"}
        ])))
        .mount(&server)
        .await;

    let exporter = MetadataExporter::new(test_client(&server.uri()), ExportOptions::default());
    let err = exporter.run().await.unwrap_err();

    assert!(matches!(err, ExportError::Authentication(_)));
    assert!(err.to_string().contains("re-authenticate"));
}

#[tokio::test]
async fn everything_filtered_yields_empty_csv() {
    let server = MockServer::start().await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "AccountShare", "label": "Account Share", "custom": false}
        ]),
    )
    .await;

    let exporter = MetadataExporter::new(test_client(&server.uri()), ExportOptions::default());
    let outcome = exporter.run().await.expect("export should succeed");

    assert_eq!(outcome.stats.objects, 0);
    assert_eq!(outcome.stats.filtered_system_objects, 1);
    assert_eq!(outcome.csv, "");
}

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<(String, u8)>>>,
}

impl ProgressSink for Recorder {
    fn update(&self, text: &str, percent: u8, _stats: &ExportStats) {
        self.events
            .lock()
            .unwrap()
            .push((text.to_string(), percent));
    }
}

#[tokio::test]
async fn progress_is_monotonic_and_completes_once() {
    let server = MockServer::start().await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "Account", "label": "Account", "custom": false},
            {"name": "MyObj__c", "label": "My Object", "custom": true}
        ]),
    )
    .await;
    mount_describe(&server, "Account", account_describe()).await;
    mount_describe(&server, "MyObj__c", my_obj_describe()).await;

    let recorder = Recorder::default();
    let exporter = MetadataExporter::new(test_client(&server.uri()), ExportOptions::default())
        .with_progress(recorder.clone());
    exporter.run().await.expect("export should succeed");

    let events = recorder.events.lock().unwrap();
    assert!(!events.is_empty());

    let percents: Vec<u8> = events.iter().map(|(_, p)| *p).collect();
    assert!(
        percents.windows(2).all(|w| w[0] <= w[1]),
        "percent must never decrease: {percents:?}"
    );
    assert_eq!(*percents.last().unwrap(), 100);
    assert_eq!(percents.iter().filter(|p| **p == 100).count(), 1);
}

#[tokio::test]
async fn permission_set_ids_are_chunked_across_queries() {
    let server = MockServer::start().await;

    let assignments: Vec<serde_json::Value> = (0..60)
        .map(|i| serde_json::json!({"PermissionSetId": format!("0PS{i:012}")}))
        .collect();

    mount_query(
        &server,
        "FROM User ",
        serde_json::json!([{
            "Id": "005000000000001",
            "Username": "jdoe@example.com"
        }]),
    )
    .await;
    mount_query(
        &server,
        "FROM PermissionSetAssignment",
        serde_json::Value::Array(assignments),
    )
    .await;
    // 60 ids with a 50-id chunk bound means exactly two queries per table.
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("q", "FROM ObjectPermissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_body(serde_json::json!([
            {
                "SobjectType": "Account",
                "PermissionsRead": true,
                "PermissionsCreate": false,
                "PermissionsEdit": false,
                "PermissionsDelete": false,
                "PermissionsViewAllRecords": false,
                "PermissionsModifyAllRecords": false
            }
        ]))))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param_contains("q", "FROM FieldPermissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_body(serde_json::json!([]))))
        .expect(2)
        .mount(&server)
        .await;

    mount_catalog(
        &server,
        serde_json::json!([
            {"name": "Account", "label": "Account", "custom": false}
        ]),
    )
    .await;
    mount_describe(&server, "Account", account_describe()).await;

    let options = ExportOptions::for_user("jdoe@example.com");
    let exporter = MetadataExporter::new(test_client(&server.uri()), options);
    let outcome = exporter.run().await.expect("export should succeed");

    assert_eq!(outcome.stats.objects, 1);
}

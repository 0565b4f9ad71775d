//! Registry and validation tests over the product catalog fixtures

use std::sync::Arc;
use std::thread;

use tenant_schemas::{
    ConflictKind, Draft202012Compiler, InMemorySchemaStore, RegistryError, SchemaCreateRequest,
    SchemaServices, SchemaStore, UiSchemaRequest, Violation,
};

const TENANT: &str = "2281";
const PRODUCT_ID: &str = "2281_product_1.0";

fn services() -> (Arc<InMemorySchemaStore>, SchemaServices) {
    let store = Arc::new(InMemorySchemaStore::new());
    let services = SchemaServices::new(store.clone(), Draft202012Compiler::new());
    (store, services)
}

fn product_request(version: &str) -> SchemaCreateRequest {
    SchemaCreateRequest::new("Product", version, include_str!("fixtures/valid_schema.json"))
}

fn with_product() -> (Arc<InMemorySchemaStore>, SchemaServices) {
    let (store, services) = services();
    services.registry.create(TENANT, product_request("1.0")).unwrap();
    (store, services)
}

// =============================================================================
// Instance Validation Tests
// =============================================================================

#[test]
fn test_valid_instance() {
    let (_, services) = with_product();
    let input = include_str!("fixtures/valid_json.json");

    assert!(services.validation.validate(input, PRODUCT_ID).unwrap().is_empty());
    services.validation.validate_and_throw(input, PRODUCT_ID).unwrap();
}

#[test]
fn test_missing_all_required_properties() {
    let (_, services) = with_product();
    let violations = services
        .validation
        .validate(include_str!("fixtures/invalid_json_missing_all_properties.json"), PRODUCT_ID)
        .unwrap();

    assert_eq!(
        violations,
        vec![
            Violation::new("", "required property 'productId' not found"),
            Violation::new("", "required property 'productName' not found"),
            Violation::new("", "required property 'price' not found"),
        ]
    );
}

#[test]
fn test_misc_errors_in_declaration_order() {
    let (_, services) = with_product();
    let violations = services
        .validation
        .validate(include_str!("fixtures/invalid_json_misc_errors.json"), PRODUCT_ID)
        .unwrap();

    assert_eq!(
        violations,
        vec![
            Violation::new("/price", "must have an exclusive minimum value of 0"),
            Violation::new("/tags/5", "integer found, string expected"),
            Violation::new("/tags", "must have only unique items in the array"),
            Violation::new("", "required property 'productName' not found"),
        ]
    );
}

#[test]
fn test_error_order_is_stable() {
    let (_, services) = with_product();
    let input = include_str!("fixtures/invalid_json_misc_errors.json");

    let first = services.validation.validate(input, PRODUCT_ID).unwrap();
    for _ in 0..5 {
        assert_eq!(services.validation.validate(input, PRODUCT_ID).unwrap(), first);
    }
}

#[test]
fn test_bad_datatype() {
    let (_, services) = with_product();
    let violations = services
        .validation
        .validate(include_str!("fixtures/invalid_json_bad_datatype.json"), PRODUCT_ID)
        .unwrap();

    assert_eq!(
        violations,
        vec![Violation::new("/productId", "string found, integer expected")]
    );
}

#[test]
fn test_not_unique_tags_throws() {
    let (_, services) = with_product();
    let err = services
        .validation
        .validate_and_throw(include_str!("fixtures/invalid_json_not_unique_tags.json"), PRODUCT_ID)
        .unwrap_err();

    assert_eq!(err.to_string(), "Constraint Violation");
    assert_eq!(
        err.violations(),
        &[Violation::new("/tags", "must have only unique items in the array")]
    );
}

#[test]
fn test_usage_statistics() {
    let (store, services) = with_product();
    let before = store.find_by_id(PRODUCT_ID).unwrap().unwrap();
    assert_eq!(before.validation_usage_count, 0);
    assert!(before.last_used_for_validation.is_none());

    services
        .validation
        .validate(include_str!("fixtures/valid_json.json"), PRODUCT_ID)
        .unwrap();
    let _ = services.validation.validate_and_throw("{}", PRODUCT_ID);

    let after = store.find_by_id(PRODUCT_ID).unwrap().unwrap();
    assert_eq!(after.validation_usage_count, 2);
    assert!(after.last_used_for_validation.is_some());
}

#[test]
fn test_concurrent_validation_counts_every_attempt() {
    let (store, services) = with_product();
    let services = Arc::new(services);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let services = Arc::clone(&services);
            thread::spawn(move || {
                for _ in 0..25 {
                    services
                        .validation
                        .validate(include_str!("fixtures/valid_json.json"), PRODUCT_ID)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let record = store.find_by_id(PRODUCT_ID).unwrap().unwrap();
    assert_eq!(record.validation_usage_count, 200);
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_greater_version_conflict_names_existing_schema() {
    let (_, services) = with_product();
    let err = services.registry.create(TENANT, product_request("0.9")).unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(
        err.to_string(),
        "Conflict: A JsonSchema with a greater version already exists! (see schema with ID: '2281_product_1.0')"
    );
}

#[test]
fn test_duplicate_conflict() {
    let (_, services) = with_product();
    let err = services.registry.create(TENANT, product_request("1.0")).unwrap_err();

    assert!(matches!(
        err,
        RegistryError::Conflict(ConflictKind::Duplicate { ref id }) if id == PRODUCT_ID
    ));
}

#[test]
fn test_latest_version_by_numeric_order() {
    let (_, services) = services();
    // Each create must not be below an existing version
    for version in ["1.1", "1.2.0", "2.0", "4.1.1", "5.7"] {
        services.registry.create(TENANT, product_request(version)).unwrap();
    }

    let latest = services.registry.get_latest_by_name(TENANT, "product").unwrap();
    assert_eq!(latest.id, "2281_product_5.7");
}

#[test]
fn test_wrong_dialect_rejected() {
    let (_, services) = services();
    let err = services
        .registry
        .create(
            TENANT,
            SchemaCreateRequest::new(
                "product",
                "1.0",
                include_str!("fixtures/invalid_schema_wrong_dialect.json"),
            ),
        )
        .unwrap_err();

    assert_eq!(
        err.violations(),
        &[Violation::new(
            "",
            "Wrong value in $schema-node. Expected: 'https://json-schema.org/draft/2020-12/schema' Found: 'https://json-schema.org/draft/2019-09/schema'"
        )]
    );
}

#[test]
fn test_stored_checksum_verifies() {
    let (_, services) = with_product();
    let record = services.registry.get_by_id(TENANT, PRODUCT_ID).unwrap();
    assert!(record.verify_checksum());
}

#[test]
fn test_delete_missing_schema_is_not_found() {
    let (_, services) = services();
    let err = services.registry.delete(TENANT, "2281_nothing_1.0").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No JsonSchema with ID '2281_nothing_1.0' was found!");
}

#[test]
fn test_validate_after_delete_is_not_found() {
    let (_, services) = with_product();
    services.registry.delete(TENANT, PRODUCT_ID).unwrap();

    let err = services.validation.validate("{}", PRODUCT_ID).unwrap_err();
    assert!(err.is_not_found());
}

// =============================================================================
// UI Schema Tests
// =============================================================================

#[test]
fn test_ui_schema_lifecycle() {
    let (_, services) = with_product();
    let value: serde_json::Value = serde_json::from_str(include_str!("fixtures/ui_schema.json")).unwrap();

    let created = services
        .ui_schemas
        .create_or_replace(
            TENANT,
            PRODUCT_ID,
            UiSchemaRequest {
                value: value.clone(),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(created.schema_id, PRODUCT_ID);

    let record = services.registry.get_by_id(TENANT, PRODUCT_ID).unwrap();
    assert_eq!(record.ui_schema().map(|ui| &ui.value), Some(&value));

    services.ui_schemas.delete(TENANT, PRODUCT_ID).unwrap();
    let err = services.ui_schemas.delete(TENANT, PRODUCT_ID).unwrap_err();
    assert_eq!(
        err.to_string(),
        "No UiSchema on JsonSchema with ID '2281_product_1.0' was found!"
    );
}

#[test]
fn test_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let (store, services) = with_product();
    services
        .validation
        .validate(include_str!("fixtures/valid_json.json"), PRODUCT_ID)
        .unwrap();
    store.persist(&path).unwrap();

    let reopened = Arc::new(InMemorySchemaStore::open(&path).unwrap());
    let services = SchemaServices::new(reopened.clone(), Draft202012Compiler::new());
    let record = services.registry.get_by_id(TENANT, PRODUCT_ID).unwrap();
    assert_eq!(record.validation_usage_count, 1);
    assert!(record.verify_checksum());

    let err = services.registry.create(TENANT, product_request("0.1")).unwrap_err();
    assert!(err.is_conflict());
}

use fieldgate_core::Subject;
use serde_json::json;

use crate::catalog;
use crate::ports::InMemoryRowStore;

use super::*;

fn service() -> AccessDecisionService {
    service_with_store(Arc::new(InMemoryRowStore::new()))
}

fn service_with_store(store: Arc<InMemoryRowStore>) -> AccessDecisionService {
    let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
    AccessDecisionService::new(Arc::new(registry), store)
}

#[tokio::test]
async fn unknown_entity_is_an_error_not_a_decision() {
    let service = service();
    let result = service
        .authorize_read(&Subject::new(1, "admin"), "widgets", None)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn entity_gate_denies_below_the_operation_minimum() {
    let service = service();

    let decision = service
        .authorize_create(&Subject::new(7, "customer"), "work_orders", &json!({}))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(decision.reason(), Some(DenyReason::EntityPermissionDenied));

    // Invoice deletion is closed to every role.
    let decision = service
        .authorize_delete(&Subject::new(1, "admin"), "invoices", Some(&json!({"id": 1})))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(decision.reason(), Some(DenyReason::EntityPermissionDenied));
}

#[tokio::test]
async fn hidden_and_missing_rows_are_indistinguishable() {
    let service = service();
    let subject = Subject::new(3, "technician");
    let foreign_row = json!({"id": 11, "assigned_technician_id": 8, "title": "Pump swap"});

    let hidden = service
        .authorize_read(&subject, "work_orders", Some(&foreign_row))
        .await
        .unwrap_or_else(|_| unreachable!());
    let missing = service
        .authorize_read(&subject, "work_orders", None)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(hidden.reason(), Some(DenyReason::RowNotFound));
    assert_eq!(hidden, missing);
}

#[tokio::test]
async fn read_returns_a_redacted_projection() {
    let service = service();
    let subject = Subject::new(3, "technician");
    let row = json!({
        "id": 11,
        "work_order_number": "WO-0011",
        "title": "Pump swap",
        "assigned_technician_id": 3,
        "internal_margin": 0.4,
    });

    let decision = service
        .authorize_read(&subject, "work_orders", Some(&row))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(decision.is_allowed());

    let projection = decision.projected_row().unwrap_or_else(|| unreachable!());
    assert_eq!(projection.get("title"), Some(&json!("Pump swap")));
    assert!(projection.get("internal_margin").is_none());
}

#[tokio::test]
async fn field_gate_names_the_denied_field() {
    let service = service();
    let subject = Subject::new(3, "technician");
    let own_row = json!({"id": 11, "assigned_technician_id": 3});

    let decision = service
        .authorize_update(
            &subject,
            "work_orders",
            Some(&own_row),
            &json!({"assigned_technician_id": 9}),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(decision.reason(), Some(DenyReason::FieldPermissionDenied));
    assert_eq!(decision.denied_field(), Some("assigned_technician_id"));

    // The same technician may move their own order through its workflow.
    let decision = service
        .authorize_update(
            &subject,
            "work_orders",
            Some(&own_row),
            &json!({"status": "completed"}),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn create_requires_externally_creatable_required_fields() {
    let service = service();
    let subject = Subject::new(4, "dispatcher");

    // work_order_number is system-assigned, so only title and customer_id
    // are demanded from the caller.
    let complete = service
        .authorize_create(
            &subject,
            "work_orders",
            &json!({"title": "Boiler inspection", "customer_id": 5}),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(complete.is_allowed());

    let incomplete = service
        .authorize_create(&subject, "work_orders", &json!({"customer_id": 5}))
        .await;
    assert!(matches!(incomplete, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn non_object_payload_is_a_validation_error() {
    let service = service();
    let result = service
        .authorize_update(
            &Subject::new(1, "admin"),
            "invoices",
            Some(&json!({"id": 1, "customer_id": 1})),
            &json!("paid"),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn payload_values_are_checked_against_field_definitions() {
    let service = service();
    let subject = Subject::new(3, "technician");
    let own_row = json!({"id": 11, "assigned_technician_id": 3});

    let result = service
        .authorize_update(
            &subject,
            "work_orders",
            Some(&own_row),
            &json!({"status": "abandoned"}),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn seeded_roles_resist_the_highest_role() {
    let service = service();
    let admin = Subject::new(1, "admin");
    let seeded = json!({"id": 5, "name": "admin", "priority": 5, "is_system_role": true});

    let delete = service
        .authorize_delete(&admin, "roles", Some(&seeded))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(delete.reason(), Some(DenyReason::SystemProtected));

    let update = service
        .authorize_update(&admin, "roles", Some(&seeded), &json!({"priority": 99}))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(update.reason(), Some(DenyReason::SystemProtected));
    assert_eq!(update.denied_field(), Some("priority"));
}

#[tokio::test]
async fn custom_roles_stay_fully_manageable() {
    let service = service();
    let admin = Subject::new(1, "admin");
    let custom = json!({"id": 9, "name": "auditor", "priority": 10, "is_system_role": false});

    let update = service
        .authorize_update(&admin, "roles", Some(&custom), &json!({"priority": 12}))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(update.is_allowed());

    let delete = service
        .authorize_delete(&admin, "roles", Some(&custom))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(delete.is_allowed());
}

#[tokio::test]
async fn attachment_visibility_follows_the_parent_row() {
    let store = Arc::new(InMemoryRowStore::new());
    store
        .insert_row(
            "work_orders",
            "42",
            json!({"id": 42, "assigned_technician_id": 3}),
        )
        .await;
    let service = service_with_store(store);

    let attachment = json!({
        "id": 900,
        "file_name": "site-photo.jpg",
        "storage_key": "blob/ab/cd",
        "entity_type": "work_orders",
        "entity_id": 42,
    });

    let assigned = service
        .authorize_read(&Subject::new(3, "technician"), "file_attachments", Some(&attachment))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(assigned.is_allowed());
    let projection = assigned.projected_row().unwrap_or_else(|| unreachable!());
    assert!(projection.get("storage_key").is_none());
    assert_eq!(projection.get("file_name"), Some(&json!("site-photo.jpg")));

    let unassigned = service
        .authorize_read(&Subject::new(9, "technician"), "file_attachments", Some(&attachment))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(unassigned.reason(), Some(DenyReason::RowNotFound));
}

#[tokio::test]
async fn system_only_operations_admit_the_internal_subject() {
    let service = service();
    let payload = json!({"user_id": 7, "title": "Invoice sent", "body": "INV-0042 is on its way."});

    let external = service
        .authorize_create(&Subject::new(1, "admin"), "notifications", &payload)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(external.reason(), Some(DenyReason::EntityPermissionDenied));

    let internal = service
        .authorize_create(&Subject::internal(), "notifications", &payload)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(internal.is_allowed());
}

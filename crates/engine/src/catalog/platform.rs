use std::collections::BTreeMap;

use fieldgate_core::AppResult;
use fieldgate_domain::{
    AccessSpec, EntityDescriptorInput, FieldType, PolymorphicAnchor, Relationship, RlsFilterConfig,
    RlsPolicy, SystemProtectionInput,
};

use super::{
    boolean, datetime, json_blob, names, number, reference, required, rls_map, standard_fields,
    text,
};

pub(super) fn roles() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("name".to_owned(), required(FieldType::Text)?),
        ("priority".to_owned(), required(FieldType::Number)?),
        ("description".to_owned(), text()),
        ("is_system_role".to_owned(), boolean()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "roles".to_owned(),
        table_name: "roles".to_owned(),
        identity_field: "name".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "name".to_owned(),
                AccessSpec::new("admin", "customer", "admin", "none"),
            ),
            (
                "priority".to_owned(),
                AccessSpec::new("admin", "customer", "admin", "none"),
            ),
            (
                "description".to_owned(),
                AccessSpec::new("admin", "customer", "admin", "none"),
            ),
            (
                "is_system_role".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("admin", "customer", "admin", "admin"),
        rls: rls_map(&[
            ("customer", RlsPolicy::PublicResource),
            ("technician", RlsPolicy::PublicResource),
            ("dispatcher", RlsPolicy::PublicResource),
            ("manager", RlsPolicy::PublicResource),
            ("admin", RlsPolicy::PublicResource),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["is_system_role"]),
        sensitive_fields: names(&[]),
        relationships: Vec::new(),
        polymorphic_anchor: None,
        // Seeded role names are injected at registry load.
        system_protection: Some(SystemProtectionInput {
            values: names(&[]),
            protected_by_field: None,
            immutable_fields: names(&["name", "priority"]),
            prevent_delete: true,
        }),
        dependents: Vec::new(),
    })
}

pub(super) fn user_preferences() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("user_id".to_owned(), required(FieldType::Reference)?),
        ("locale".to_owned(), text()),
        ("timezone".to_owned(), text()),
        ("notification_settings".to_owned(), json_blob()),
        ("dashboard_layout".to_owned(), json_blob()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "user_preferences".to_owned(),
        table_name: "user_preferences".to_owned(),
        identity_field: "user_id".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "user_id".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "locale".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "timezone".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "notification_settings".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "dashboard_layout".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("customer", "customer", "customer", "customer"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::OwnRecordOnly),
            ("manager", RlsPolicy::OwnRecordOnly),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["user_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "owner".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "user_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn saved_views() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("name".to_owned(), required(FieldType::Text)?),
        ("user_id".to_owned(), required(FieldType::Reference)?),
        ("entity_key".to_owned(), text()),
        ("filters".to_owned(), json_blob()),
        ("sort_order".to_owned(), json_blob()),
        ("is_default".to_owned(), boolean()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "saved_views".to_owned(),
        table_name: "saved_views".to_owned(),
        identity_field: "name".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "name".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "user_id".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "entity_key".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "filters".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "sort_order".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
            (
                "is_default".to_owned(),
                AccessSpec::new("customer", "customer", "customer", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("customer", "customer", "customer", "customer"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::OwnRecordOnly),
            ("manager", RlsPolicy::OwnRecordOnly),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["user_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "owner".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "user_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn file_attachments() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("file_name".to_owned(), required(FieldType::Text)?),
        ("content_type".to_owned(), text()),
        ("byte_size".to_owned(), number()),
        ("storage_key".to_owned(), text()),
        ("entity_type".to_owned(), required(FieldType::Text)?),
        ("entity_id".to_owned(), required(FieldType::Reference)?),
        ("uploaded_by".to_owned(), reference()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "file_attachments".to_owned(),
        table_name: "file_attachments".to_owned(),
        identity_field: "file_name".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "file_name".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "content_type".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "byte_size".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "storage_key".to_owned(),
                AccessSpec::new("system", "none", "none", "none"),
            ),
            (
                "entity_type".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "entity_id".to_owned(),
                AccessSpec::new("customer", "customer", "none", "none"),
            ),
            (
                "uploaded_by".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("customer", "customer", "manager", "dispatcher"),
        rls: rls_map(&[
            ("customer", RlsPolicy::ParentEntityAccess),
            ("technician", RlsPolicy::ParentEntityAccess),
            ("dispatcher", RlsPolicy::ParentEntityAccess),
            ("manager", RlsPolicy::ParentEntityAccess),
            ("admin", RlsPolicy::ParentEntityAccess),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["entity_type", "entity_id", "storage_key"]),
        sensitive_fields: names(&["storage_key"]),
        relationships: vec![Relationship {
            name: "uploader".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "uploaded_by".to_owned(),
        }],
        polymorphic_anchor: Some(PolymorphicAnchor {
            type_field: "entity_type".to_owned(),
            id_field: "entity_id".to_owned(),
            allowed_parents: vec![
                "work_orders".to_owned(),
                "customers".to_owned(),
                "invoices".to_owned(),
                "contracts".to_owned(),
            ],
        }),
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn notifications() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("user_id".to_owned(), required(FieldType::Reference)?),
        ("title".to_owned(), required(FieldType::Text)?),
        ("body".to_owned(), text()),
        ("is_read".to_owned(), boolean()),
        ("sent_at".to_owned(), datetime()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "notifications".to_owned(),
        table_name: "notifications".to_owned(),
        identity_field: "title".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "user_id".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "title".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "body".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "is_read".to_owned(),
                AccessSpec::new("system", "customer", "customer", "none"),
            ),
            (
                "sent_at".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("system", "customer", "customer", "customer"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::OwnRecordOnly),
            ("manager", RlsPolicy::OwnRecordOnly),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["user_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "recipient".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "user_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn audit_logs() -> AppResult<EntityDescriptorInput> {
    let fields = BTreeMap::from([
        ("id".to_owned(), number()),
        ("actor_id".to_owned(), number()),
        ("action".to_owned(), required(FieldType::Text)?),
        ("resource_type".to_owned(), text()),
        ("resource_id".to_owned(), text()),
        ("detail".to_owned(), json_blob()),
        ("created_at".to_owned(), datetime()),
    ]);

    Ok(EntityDescriptorInput {
        entity_key: "audit_logs".to_owned(),
        table_name: "audit_logs".to_owned(),
        identity_field: "id".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "actor_id".to_owned(),
                AccessSpec::new("system", "manager", "none", "none"),
            ),
            (
                "action".to_owned(),
                AccessSpec::new("system", "manager", "none", "none"),
            ),
            (
                "resource_type".to_owned(),
                AccessSpec::new("system", "manager", "none", "none"),
            ),
            (
                "resource_id".to_owned(),
                AccessSpec::new("system", "manager", "none", "none"),
            ),
            (
                "detail".to_owned(),
                AccessSpec::new("system", "manager", "none", "none"),
            ),
        ]),
        // Append-only: nothing updates or deletes audit rows via requests.
        entity_permissions: AccessSpec::new("system", "manager", "none", "none"),
        rls: rls_map(&[
            ("customer", RlsPolicy::DenyAll),
            ("technician", RlsPolicy::DenyAll),
            ("dispatcher", RlsPolicy::DenyAll),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: RlsFilterConfig::default(),
        immutable_fields: names(&["actor_id", "action", "resource_type", "resource_id", "detail"]),
        sensitive_fields: names(&[]),
        relationships: Vec::new(),
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

use std::collections::BTreeMap;

use fieldgate_core::AppResult;
use fieldgate_domain::{
    AccessSpec, DependentEntity, EntityDescriptorInput, FieldType, Relationship, RlsPolicy,
};

use super::{
    boolean, json_blob, names, number, own_by, reference, required, rls_map, standard_fields, text,
};

pub(super) fn users() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("email".to_owned(), required(FieldType::Text)?),
        ("full_name".to_owned(), text()),
        ("phone".to_owned(), text()),
        ("role_id".to_owned(), reference()),
        ("auth0_id".to_owned(), text()),
        ("is_active".to_owned(), boolean()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "users".to_owned(),
        table_name: "users".to_owned(),
        identity_field: "email".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "email".to_owned(),
                AccessSpec::new("manager", "customer", "admin", "none"),
            ),
            (
                "full_name".to_owned(),
                AccessSpec::new("manager", "customer", "customer", "none"),
            ),
            (
                "phone".to_owned(),
                AccessSpec::new("manager", "customer", "customer", "none"),
            ),
            (
                "role_id".to_owned(),
                AccessSpec::new("admin", "customer", "admin", "none"),
            ),
            (
                "auth0_id".to_owned(),
                AccessSpec::new("system", "none", "none", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("manager", "customer", "customer", "admin"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("id"),
        immutable_fields: names(&["email", "auth0_id"]),
        sensitive_fields: names(&["auth0_id"]),
        relationships: vec![Relationship {
            name: "role".to_owned(),
            target_entity: "roles".to_owned(),
            local_field: "role_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: vec![
            DependentEntity {
                entity_key: "user_preferences".to_owned(),
                foreign_key_field: "user_id".to_owned(),
            },
            DependentEntity {
                entity_key: "saved_views".to_owned(),
                foreign_key_field: "user_id".to_owned(),
            },
            DependentEntity {
                entity_key: "notifications".to_owned(),
                foreign_key_field: "user_id".to_owned(),
            },
        ],
    })
}

pub(super) fn customers() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("company_name".to_owned(), required(FieldType::Text)?),
        ("contact_name".to_owned(), text()),
        ("contact_email".to_owned(), text()),
        ("phone".to_owned(), text()),
        ("billing_address".to_owned(), text()),
        ("service_address".to_owned(), text()),
        ("user_id".to_owned(), reference()),
        ("credit_hold".to_owned(), boolean()),
        ("notes".to_owned(), text()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "customers".to_owned(),
        table_name: "customers".to_owned(),
        identity_field: "company_name".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "company_name".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "contact_name".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "contact_email".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "phone".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "billing_address".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "service_address".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "user_id".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "credit_hold".to_owned(),
                AccessSpec::new("manager", "dispatcher", "manager", "none"),
            ),
            (
                "notes".to_owned(),
                AccessSpec::new("dispatcher", "technician", "dispatcher", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("dispatcher", "customer", "dispatcher", "manager"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::AllRecords),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("id"),
        immutable_fields: names(&["user_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "portal_user".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "user_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: vec![
            DependentEntity {
                entity_key: "work_orders".to_owned(),
                foreign_key_field: "customer_id".to_owned(),
            },
            DependentEntity {
                entity_key: "contracts".to_owned(),
                foreign_key_field: "customer_id".to_owned(),
            },
            DependentEntity {
                entity_key: "invoices".to_owned(),
                foreign_key_field: "customer_id".to_owned(),
            },
        ],
    })
}

pub(super) fn technicians() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("employee_number".to_owned(), required(FieldType::Text)?),
        ("user_id".to_owned(), reference()),
        ("skill_tags".to_owned(), json_blob()),
        ("home_region".to_owned(), text()),
        ("hourly_cost".to_owned(), number()),
        ("is_active".to_owned(), boolean()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "technicians".to_owned(),
        table_name: "technicians".to_owned(),
        identity_field: "employee_number".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "employee_number".to_owned(),
                AccessSpec::new("manager", "technician", "none", "none"),
            ),
            (
                "user_id".to_owned(),
                AccessSpec::new("manager", "manager", "none", "none"),
            ),
            (
                "skill_tags".to_owned(),
                AccessSpec::new("manager", "technician", "manager", "none"),
            ),
            (
                "home_region".to_owned(),
                AccessSpec::new("manager", "technician", "manager", "none"),
            ),
            (
                "hourly_cost".to_owned(),
                AccessSpec::new("manager", "manager", "manager", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("manager", "technician", "manager", "admin"),
        rls: rls_map(&[
            ("customer", RlsPolicy::DenyAll),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("id"),
        immutable_fields: names(&["employee_number", "user_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "account".to_owned(),
            target_entity: "users".to_owned(),
            local_field: "user_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

use std::collections::BTreeMap;

use fieldgate_core::AppResult;
use fieldgate_domain::{
    AccessSpec, DependentEntity, EntityDescriptorInput, FieldType, Relationship, RlsPolicy,
};

use super::{
    boolean, choice, date, datetime, json_blob, names, number, own_by, reference, required,
    rls_map, standard_fields, text,
};

pub(super) fn work_orders() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("work_order_number".to_owned(), required(FieldType::Text)?),
        ("title".to_owned(), required(FieldType::Text)?),
        ("description".to_owned(), text()),
        (
            "status".to_owned(),
            choice(
                &["draft", "scheduled", "in_progress", "completed", "cancelled"],
                "draft",
            )?,
        ),
        (
            "priority".to_owned(),
            choice(&["low", "normal", "high", "emergency"], "normal")?,
        ),
        ("customer_id".to_owned(), required(FieldType::Reference)?),
        ("assigned_technician_id".to_owned(), reference()),
        ("scheduled_start".to_owned(), datetime()),
        ("scheduled_end".to_owned(), datetime()),
        ("completion_notes".to_owned(), text()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "work_orders".to_owned(),
        table_name: "work_orders".to_owned(),
        identity_field: "work_order_number".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "work_order_number".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "title".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "description".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "status".to_owned(),
                AccessSpec::new("dispatcher", "customer", "technician", "none"),
            ),
            (
                "priority".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "customer_id".to_owned(),
                AccessSpec::new("dispatcher", "customer", "none", "none"),
            ),
            (
                "assigned_technician_id".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "scheduled_start".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "scheduled_end".to_owned(),
                AccessSpec::new("dispatcher", "customer", "dispatcher", "none"),
            ),
            (
                "completion_notes".to_owned(),
                AccessSpec::new("technician", "customer", "technician", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("dispatcher", "customer", "technician", "manager"),
        rls: rls_map(&[
            ("customer", RlsPolicy::DenyAll),
            ("technician", RlsPolicy::OwnRecordOnly),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("assigned_technician_id"),
        immutable_fields: names(&["work_order_number", "customer_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![
            Relationship {
                name: "customer".to_owned(),
                target_entity: "customers".to_owned(),
                local_field: "customer_id".to_owned(),
            },
            Relationship {
                name: "assigned_technician".to_owned(),
                target_entity: "technicians".to_owned(),
                local_field: "assigned_technician_id".to_owned(),
            },
        ],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: vec![DependentEntity {
            entity_key: "file_attachments".to_owned(),
            foreign_key_field: "entity_id".to_owned(),
        }],
    })
}

pub(super) fn contracts() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("contract_number".to_owned(), required(FieldType::Text)?),
        ("customer_id".to_owned(), required(FieldType::Reference)?),
        ("start_date".to_owned(), date()),
        ("end_date".to_owned(), date()),
        ("terms".to_owned(), json_blob()),
        ("monthly_value".to_owned(), number()),
        (
            "status".to_owned(),
            choice(&["draft", "active", "expired", "cancelled"], "draft")?,
        ),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "contracts".to_owned(),
        table_name: "contracts".to_owned(),
        identity_field: "contract_number".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "contract_number".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "customer_id".to_owned(),
                AccessSpec::new("manager", "customer", "none", "none"),
            ),
            (
                "start_date".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "end_date".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "terms".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "monthly_value".to_owned(),
                AccessSpec::new("manager", "manager", "manager", "none"),
            ),
            (
                "status".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("manager", "customer", "manager", "admin"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::DenyAll),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("customer_id"),
        immutable_fields: names(&["contract_number", "customer_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![Relationship {
            name: "customer".to_owned(),
            target_entity: "customers".to_owned(),
            local_field: "customer_id".to_owned(),
        }],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn invoices() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("invoice_number".to_owned(), required(FieldType::Text)?),
        ("customer_id".to_owned(), required(FieldType::Reference)?),
        ("work_order_id".to_owned(), reference()),
        ("amount_due".to_owned(), number()),
        ("tax".to_owned(), number()),
        (
            "status".to_owned(),
            choice(&["draft", "sent", "paid", "void"], "draft")?,
        ),
        ("issued_at".to_owned(), datetime()),
        ("due_at".to_owned(), datetime()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "invoices".to_owned(),
        table_name: "invoices".to_owned(),
        identity_field: "invoice_number".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "invoice_number".to_owned(),
                AccessSpec::new("system", "customer", "none", "none"),
            ),
            (
                "customer_id".to_owned(),
                AccessSpec::new("manager", "customer", "none", "none"),
            ),
            (
                "work_order_id".to_owned(),
                AccessSpec::new("manager", "customer", "none", "none"),
            ),
            (
                "amount_due".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "tax".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "status".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "issued_at".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
            (
                "due_at".to_owned(),
                AccessSpec::new("manager", "customer", "manager", "none"),
            ),
        ]),
        // Invoices are voided, never deleted.
        entity_permissions: AccessSpec::new("manager", "customer", "manager", "none"),
        rls: rls_map(&[
            ("customer", RlsPolicy::OwnRecordOnly),
            ("technician", RlsPolicy::DenyAll),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("customer_id"),
        immutable_fields: names(&["invoice_number", "customer_id", "work_order_id"]),
        sensitive_fields: names(&[]),
        relationships: vec![
            Relationship {
                name: "customer".to_owned(),
                target_entity: "customers".to_owned(),
                local_field: "customer_id".to_owned(),
            },
            Relationship {
                name: "work_order".to_owned(),
                target_entity: "work_orders".to_owned(),
                local_field: "work_order_id".to_owned(),
            },
        ],
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

pub(super) fn inventory_items() -> AppResult<EntityDescriptorInput> {
    let mut fields = standard_fields();
    fields.extend(BTreeMap::from([
        ("sku".to_owned(), required(FieldType::Text)?),
        ("name".to_owned(), required(FieldType::Text)?),
        ("description".to_owned(), text()),
        ("quantity_on_hand".to_owned(), number()),
        ("unit_cost".to_owned(), number()),
        ("reorder_threshold".to_owned(), number()),
        ("is_active".to_owned(), boolean()),
    ]));

    Ok(EntityDescriptorInput {
        entity_key: "inventory_items".to_owned(),
        table_name: "inventory_items".to_owned(),
        identity_field: "sku".to_owned(),
        fields,
        field_access: BTreeMap::from([
            (
                "sku".to_owned(),
                AccessSpec::new("manager", "technician", "none", "none"),
            ),
            (
                "name".to_owned(),
                AccessSpec::new("manager", "technician", "manager", "none"),
            ),
            (
                "description".to_owned(),
                AccessSpec::new("manager", "technician", "manager", "none"),
            ),
            (
                "quantity_on_hand".to_owned(),
                AccessSpec::new("manager", "technician", "technician", "none"),
            ),
            (
                "unit_cost".to_owned(),
                AccessSpec::new("manager", "manager", "manager", "none"),
            ),
            (
                "reorder_threshold".to_owned(),
                AccessSpec::new("manager", "dispatcher", "manager", "none"),
            ),
        ]),
        entity_permissions: AccessSpec::new("manager", "technician", "technician", "manager"),
        rls: rls_map(&[
            ("customer", RlsPolicy::DenyAll),
            ("technician", RlsPolicy::AllRecords),
            ("dispatcher", RlsPolicy::AllRecords),
            ("manager", RlsPolicy::AllRecords),
            ("admin", RlsPolicy::AllRecords),
        ]),
        rls_filter: own_by("id"),
        immutable_fields: names(&["sku"]),
        sensitive_fields: names(&[]),
        relationships: Vec::new(),
        polymorphic_anchor: None,
        system_protection: None,
        dependents: Vec::new(),
    })
}

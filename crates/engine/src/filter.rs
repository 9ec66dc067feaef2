use fieldgate_core::Subject;
use fieldgate_domain::{EntityDescriptor, Operation, RoleHierarchy};
use serde_json::{Map, Value};

use crate::field_access::can_access_field;

/// Projects a row down to the fields the subject may read.
///
/// Pure projection: keys are kept or dropped, never renamed or transformed.
/// Sensitive fields are stripped unconditionally as a second layer, so a
/// misconfigured access entry still cannot leak them.
#[must_use]
pub fn filter_for_read(
    descriptor: &EntityDescriptor,
    hierarchy: &RoleHierarchy,
    subject: &Subject,
    row: &Value,
) -> Value {
    let mut projected = Map::new();

    if let Some(object) = row.as_object() {
        for (key, value) in object {
            if descriptor.sensitive_fields().contains(key.as_str()) {
                continue;
            }
            if can_access_field(descriptor, hierarchy, key, Operation::Read, subject) {
                projected.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use fieldgate_core::{NonEmptyString, Subject};
    use fieldgate_domain::{
        AccessRequirement, EntityDescriptor, EntityDescriptorParts, FieldAccessRule,
        FieldDefinition, FieldType, Operation, RlsFilterConfig, RlsPolicy, RoleHierarchy, RoleName,
    };
    use serde_json::json;

    use crate::catalog;
    use crate::field_access::can_access_field;

    use super::filter_for_read;

    #[test]
    fn projection_drops_unreadable_fields() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("technicians")
            .unwrap_or_else(|| unreachable!());

        let row = json!({
            "id": 2,
            "employee_number": "T-0002",
            "hourly_cost": 41.5,
        });

        let technician_view = filter_for_read(
            descriptor,
            registry.hierarchy(),
            &Subject::new(2, "technician"),
            &row,
        );
        assert!(technician_view.get("employee_number").is_some());
        assert!(technician_view.get("hourly_cost").is_none());

        let manager_view = filter_for_read(
            descriptor,
            registry.hierarchy(),
            &Subject::new(4, "manager"),
            &row,
        );
        assert!(manager_view.get("hourly_cost").is_some());
    }

    #[test]
    fn sensitive_fields_never_survive_projection() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("file_attachments")
            .unwrap_or_else(|| unreachable!());

        let row = json!({
            "id": 900,
            "file_name": "site-photo.jpg",
            "storage_key": "s3://bucket/object",
        });

        for role in ["customer", "technician", "dispatcher", "manager", "admin"] {
            let view = filter_for_read(
                descriptor,
                registry.hierarchy(),
                &Subject::new(1, role),
                &row,
            );
            assert!(view.get("storage_key").is_none(), "leaked to '{role}'");
        }

        // Even the internal subject, which passes every role check, does not
        // get sensitive fields back through this layer.
        let internal_view = filter_for_read(
            descriptor,
            registry.hierarchy(),
            &Subject::internal(),
            &row,
        );
        assert!(internal_view.get("storage_key").is_none());
    }

    #[test]
    fn sensitive_strip_overrides_a_permissive_access_rule() {
        let role = RoleName::new("customer").unwrap_or_else(|_| unreachable!());
        let hierarchy =
            RoleHierarchy::new(vec![(role.clone(), 1)]).unwrap_or_else(|_| unreachable!());
        let open_rule = || {
            FieldAccessRule::new(
                AccessRequirement::MinimumRole(role.clone()),
                AccessRequirement::MinimumRole(role.clone()),
                AccessRequirement::MinimumRole(role.clone()),
                AccessRequirement::MinimumRole(role.clone()),
            )
        };

        let fields = BTreeMap::from([
            ("name".to_owned(), FieldDefinition::plain(FieldType::Text)),
            ("api_token".to_owned(), FieldDefinition::plain(FieldType::Text)),
        ]);
        let field_access = BTreeMap::from([
            ("name".to_owned(), open_rule()),
            ("api_token".to_owned(), open_rule()),
        ]);

        let descriptor = EntityDescriptor::new(EntityDescriptorParts {
            entity_key: NonEmptyString::new("integrations").unwrap_or_else(|_| unreachable!()),
            table_name: NonEmptyString::new("integrations").unwrap_or_else(|_| unreachable!()),
            identity_field: "name".to_owned(),
            fields,
            field_access,
            entity_permissions: open_rule(),
            rls: BTreeMap::from([("customer".to_owned(), RlsPolicy::AllRecords)]),
            rls_filter: RlsFilterConfig::default(),
            immutable_fields: BTreeSet::new(),
            sensitive_fields: BTreeSet::from(["api_token".to_owned()]),
            relationships: Vec::new(),
            polymorphic_anchor: None,
            system_protection: None,
            dependents: Vec::new(),
        })
        .unwrap_or_else(|_| unreachable!());

        // The access rule alone would let the token through.
        let subject = Subject::new(1, "customer");
        assert!(can_access_field(
            &descriptor,
            &hierarchy,
            "api_token",
            Operation::Read,
            &subject
        ));

        let view = filter_for_read(
            &descriptor,
            &hierarchy,
            &subject,
            &json!({"name": "webhook", "api_token": "tok_3fb1"}),
        );
        assert!(view.get("api_token").is_none());
        assert_eq!(view.get("name"), Some(&json!("webhook")));
    }

    #[test]
    fn undeclared_row_keys_are_dropped() {
        let registry = catalog::registry().unwrap_or_else(|_| unreachable!());
        let descriptor = registry
            .descriptor("customers")
            .unwrap_or_else(|| unreachable!());

        let row = json!({"id": 7, "company_name": "Acme HVAC", "stray_column": true});
        let view = filter_for_read(
            descriptor,
            registry.hierarchy(),
            &Subject::new(7, "customer"),
            &row,
        );
        assert!(view.get("stray_column").is_none());
        assert!(view.get("company_name").is_some());
    }
}

use std::collections::{BTreeMap, BTreeSet};

use fieldgate_core::{AppError, AppResult, NonEmptyString};
use fieldgate_domain::{
    AccessRequirement, AccessSpec, EntityDescriptor, EntityDescriptorInput, EntityDescriptorParts,
    FieldAccessRule, RlsPolicy, RoleHierarchy, SystemProtection,
};

/// Role managing status-style fields under the universal defaults.
const STATUS_STEWARD_ROLE: &str = "manager";

/// Field names covered by the system-managed universal default.
const SYSTEM_MANAGED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Field names covered by the steward-managed universal default.
const STEWARD_MANAGED_FIELDS: &[&str] = &["is_active", "status"];

/// Process-wide, read-only mapping from entity key to materialized descriptor.
///
/// Built once before request serving begins. Every load-time invariant is
/// checked eagerly and every violation is reported in one configuration
/// error, so a half-valid registry never exists.
#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    hierarchy: RoleHierarchy,
    descriptors: BTreeMap<String, EntityDescriptor>,
}

impl MetadataRegistry {
    /// Validates and materializes descriptor inputs into a registry.
    ///
    /// `injected_protected_values` carries protected identity values sourced
    /// from live data (seeded role names), keyed by entity; the descriptor
    /// never fetches them itself.
    pub fn load(
        hierarchy: RoleHierarchy,
        inputs: Vec<EntityDescriptorInput>,
        injected_protected_values: BTreeMap<String, BTreeSet<String>>,
    ) -> AppResult<Self> {
        let mut violations = Vec::new();

        let mut entity_keys = BTreeSet::new();
        for input in &inputs {
            if !entity_keys.insert(input.entity_key.clone()) {
                violations.push(format!("duplicate entity key '{}'", input.entity_key));
            }
        }

        for entity_key in injected_protected_values.keys() {
            let declares_protection = inputs
                .iter()
                .any(|input| &input.entity_key == entity_key && input.system_protection.is_some());
            if !declares_protection {
                violations.push(format!(
                    "protected values injected for entity '{entity_key}' which declares no system_protection"
                ));
            }
        }

        let mut descriptors = BTreeMap::new();
        for input in inputs {
            Self::check_references(&input, &entity_keys, &mut violations);

            let injected = injected_protected_values.get(&input.entity_key);
            match Self::materialize(&hierarchy, input, injected) {
                Ok(descriptor) => {
                    descriptors.insert(descriptor.entity_key().to_owned(), descriptor);
                }
                Err(mut entity_violations) => violations.append(&mut entity_violations),
            }
        }

        if !violations.is_empty() {
            return Err(AppError::Configuration(violations.join("; ")));
        }

        Ok(Self {
            hierarchy,
            descriptors,
        })
    }

    /// Returns the descriptor for an entity key.
    #[must_use]
    pub fn descriptor(&self, entity_key: &str) -> Option<&EntityDescriptor> {
        self.descriptors.get(entity_key)
    }

    /// Returns the role hierarchy the registry was validated against.
    #[must_use]
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Returns all registered entity keys.
    pub fn entity_keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    fn check_references(
        input: &EntityDescriptorInput,
        entity_keys: &BTreeSet<String>,
        violations: &mut Vec<String>,
    ) {
        let entity_key = input.entity_key.as_str();

        if let Some(anchor) = &input.polymorphic_anchor {
            for parent in &anchor.allowed_parents {
                if !entity_keys.contains(parent) {
                    violations.push(format!(
                        "entity '{entity_key}': anchor parent '{parent}' is not a registered entity"
                    ));
                }
            }
        }

        for dependent in &input.dependents {
            if !entity_keys.contains(&dependent.entity_key) {
                violations.push(format!(
                    "entity '{entity_key}': dependent '{}' is not a registered entity",
                    dependent.entity_key
                ));
            }
        }

        for relationship in &input.relationships {
            if !entity_keys.contains(&relationship.target_entity) {
                violations.push(format!(
                    "entity '{entity_key}': relationship '{}' targets unregistered entity '{}'",
                    relationship.name, relationship.target_entity
                ));
            }
        }
    }

    fn materialize(
        hierarchy: &RoleHierarchy,
        input: EntityDescriptorInput,
        injected_protected_values: Option<&BTreeSet<String>>,
    ) -> Result<EntityDescriptor, Vec<String>> {
        let entity_key = input.entity_key.clone();
        let mut violations = Vec::new();

        for role_name in input.rls.keys() {
            if !hierarchy.contains(role_name) {
                violations.push(format!(
                    "entity '{entity_key}': rls policy references undefined role '{role_name}'"
                ));
            }
        }

        let entity_permissions = Self::parse_spec(
            hierarchy,
            &entity_key,
            "entity_permissions",
            &input.entity_permissions,
            &mut violations,
        );

        let mut field_access = BTreeMap::new();
        for (field_name, spec) in &input.field_access {
            if let Some(rule) =
                Self::parse_spec(hierarchy, &entity_key, field_name, spec, &mut violations)
            {
                field_access.insert(field_name.clone(), rule);
            }
        }

        for field_name in input.fields.keys() {
            if field_access.contains_key(field_name) {
                continue;
            }
            match Self::universal_default(hierarchy, field_name) {
                Ok(Some(rule)) => {
                    field_access.insert(field_name.clone(), rule);
                }
                Ok(None) => violations.push(format!(
                    "entity '{entity_key}': field '{field_name}' has no access entry and no universal default"
                )),
                Err(message) => {
                    violations.push(format!("entity '{entity_key}': {message}"));
                }
            }
        }

        // Roles without an explicit tag see nothing.
        let mut rls = input.rls.clone();
        for role_name in hierarchy.role_names() {
            rls.entry(role_name.to_owned()).or_insert(RlsPolicy::DenyAll);
        }

        let system_protection = input.system_protection.as_ref().map(|protection| {
            let materialized = SystemProtection::new(
                protection.values.clone(),
                protection.protected_by_field.clone(),
                protection.immutable_fields.clone(),
                protection.prevent_delete,
            );
            match injected_protected_values {
                Some(values) => materialized.with_injected_values(values),
                None => materialized,
            }
        });

        let entity_key_value = match NonEmptyString::new(input.entity_key.clone()) {
            Ok(value) => Some(value),
            Err(error) => {
                violations.push(error.to_string());
                None
            }
        };
        let table_name_value = match NonEmptyString::new(input.table_name.clone()) {
            Ok(value) => Some(value),
            Err(error) => {
                violations.push(format!("entity '{entity_key}': {error}"));
                None
            }
        };

        let (Some(entity_key_value), Some(table_name_value), Some(entity_permissions)) =
            (entity_key_value, table_name_value, entity_permissions)
        else {
            return Err(violations);
        };

        if !violations.is_empty() {
            return Err(violations);
        }

        EntityDescriptor::new(EntityDescriptorParts {
            entity_key: entity_key_value,
            table_name: table_name_value,
            identity_field: input.identity_field,
            fields: input.fields,
            field_access,
            entity_permissions,
            rls,
            rls_filter: input.rls_filter,
            immutable_fields: input.immutable_fields,
            sensitive_fields: input.sensitive_fields,
            relationships: input.relationships,
            polymorphic_anchor: input.polymorphic_anchor,
            system_protection,
            dependents: input.dependents,
        })
        .map_err(|error| vec![error.to_string()])
    }

    fn parse_spec(
        hierarchy: &RoleHierarchy,
        entity_key: &str,
        context: &str,
        spec: &AccessSpec,
        violations: &mut Vec<String>,
    ) -> Option<FieldAccessRule> {
        let create = Self::parse_requirement(hierarchy, entity_key, context, &spec.create, violations);
        let read = Self::parse_requirement(hierarchy, entity_key, context, &spec.read, violations);
        let update = Self::parse_requirement(hierarchy, entity_key, context, &spec.update, violations);
        let delete = Self::parse_requirement(hierarchy, entity_key, context, &spec.delete, violations);

        Some(FieldAccessRule::new(create?, read?, update?, delete?))
    }

    fn parse_requirement(
        hierarchy: &RoleHierarchy,
        entity_key: &str,
        context: &str,
        value: &str,
        violations: &mut Vec<String>,
    ) -> Option<AccessRequirement> {
        let requirement = match AccessRequirement::parse(value) {
            Ok(requirement) => requirement,
            Err(error) => {
                violations.push(format!("entity '{entity_key}' ({context}): {error}"));
                return None;
            }
        };

        if let AccessRequirement::MinimumRole(role) = &requirement {
            if !hierarchy.contains(role.as_str()) {
                violations.push(format!(
                    "entity '{entity_key}' ({context}): undefined role '{}'",
                    role.as_str()
                ));
                return None;
            }
        }

        Some(requirement)
    }

    /// Universal fallback rules for conventional columns.
    ///
    /// System-managed columns are set by the storage layer, never through the
    /// request path; status-style columns are steward-managed but readable by
    /// every authenticated role.
    fn universal_default(
        hierarchy: &RoleHierarchy,
        field_name: &str,
    ) -> Result<Option<FieldAccessRule>, String> {
        let any_authenticated =
            AccessRequirement::MinimumRole(hierarchy.lowest().clone());

        if SYSTEM_MANAGED_FIELDS.contains(&field_name) {
            return Ok(Some(FieldAccessRule::new(
                AccessRequirement::Nobody,
                any_authenticated,
                AccessRequirement::Nobody,
                AccessRequirement::Nobody,
            )));
        }

        if STEWARD_MANAGED_FIELDS.contains(&field_name) {
            if !hierarchy.contains(STATUS_STEWARD_ROLE) {
                return Err(format!(
                    "field '{field_name}' needs the universal steward default but role '{STATUS_STEWARD_ROLE}' is not in the hierarchy"
                ));
            }
            let steward = AccessRequirement::MinimumRole(
                fieldgate_domain::RoleName::new(STATUS_STEWARD_ROLE)
                    .map_err(|error| error.to_string())?,
            );
            return Ok(Some(FieldAccessRule::new(
                steward.clone(),
                any_authenticated,
                steward,
                AccessRequirement::Nobody,
            )));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use fieldgate_core::Subject;
    use fieldgate_domain::{
        AccessRequirement, AccessSpec, EntityDescriptorInput, FieldDefinition, FieldType,
        Operation, RlsFilterConfig, RlsPolicy, RoleHierarchy, RoleName,
    };

    use super::MetadataRegistry;

    fn hierarchy() -> RoleHierarchy {
        let entries = [("customer", 1), ("manager", 4), ("admin", 5)]
            .iter()
            .map(|(name, priority)| {
                (
                    RoleName::new(*name).unwrap_or_else(|_| unreachable!()),
                    *priority,
                )
            })
            .collect();
        RoleHierarchy::new(entries).unwrap_or_else(|_| unreachable!())
    }

    fn minimal_input(entity_key: &str) -> EntityDescriptorInput {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_owned(), FieldDefinition::plain(FieldType::Number));
        fields.insert("name".to_owned(), FieldDefinition::plain(FieldType::Text));
        fields.insert(
            "created_at".to_owned(),
            FieldDefinition::plain(FieldType::DateTime),
        );

        let mut field_access = BTreeMap::new();
        field_access.insert(
            "name".to_owned(),
            AccessSpec::new("manager", "customer", "manager", "none"),
        );

        EntityDescriptorInput {
            entity_key: entity_key.to_owned(),
            table_name: entity_key.to_owned(),
            identity_field: "name".to_owned(),
            fields,
            field_access,
            entity_permissions: AccessSpec::new("manager", "customer", "manager", "admin"),
            rls: BTreeMap::from([("customer".to_owned(), RlsPolicy::AllRecords)]),
            rls_filter: RlsFilterConfig::default(),
            immutable_fields: BTreeSet::new(),
            sensitive_fields: BTreeSet::new(),
            relationships: Vec::new(),
            polymorphic_anchor: None,
            system_protection: None,
            dependents: Vec::new(),
        }
    }

    #[test]
    fn load_materializes_universal_defaults() {
        let registry = MetadataRegistry::load(hierarchy(), vec![minimal_input("widgets")], BTreeMap::new())
            .unwrap_or_else(|_| unreachable!());

        let descriptor = registry
            .descriptor("widgets")
            .unwrap_or_else(|| unreachable!());
        let id_rule = descriptor
            .access_rule("id")
            .unwrap_or_else(|| unreachable!());

        assert_eq!(
            id_rule.requirement_for(Operation::Create),
            &AccessRequirement::Nobody
        );
        assert!(registry.hierarchy().satisfies(
            &Subject::new(1, "customer"),
            id_rule.requirement_for(Operation::Read)
        ));
    }

    #[test]
    fn load_completes_rls_with_deny_all() {
        let registry = MetadataRegistry::load(hierarchy(), vec![minimal_input("widgets")], BTreeMap::new())
            .unwrap_or_else(|_| unreachable!());

        let descriptor = registry
            .descriptor("widgets")
            .unwrap_or_else(|| unreachable!());
        assert_eq!(descriptor.rls_for("manager"), RlsPolicy::DenyAll);
        assert_eq!(descriptor.rls_for("customer"), RlsPolicy::AllRecords);
    }

    #[test]
    fn load_rejects_undefined_roles_everywhere() {
        let mut input = minimal_input("widgets");
        input.field_access.insert(
            "name".to_owned(),
            AccessSpec::new("supervisor", "customer", "manager", "none"),
        );
        input
            .rls
            .insert("auditor".to_owned(), RlsPolicy::AllRecords);

        let error = MetadataRegistry::load(hierarchy(), vec![input], BTreeMap::new());
        let Err(error) = error else {
            unreachable!("undefined roles must fail the load");
        };
        let message = error.to_string();
        assert!(message.contains("supervisor"));
        assert!(message.contains("auditor"));
    }

    #[test]
    fn load_rejects_field_without_rule_or_default() {
        let mut input = minimal_input("widgets");
        input.fields.insert(
            "serial_number".to_owned(),
            FieldDefinition::plain(FieldType::Text),
        );

        let result = MetadataRegistry::load(hierarchy(), vec![input], BTreeMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_duplicate_entity_keys() {
        let result = MetadataRegistry::load(
            hierarchy(),
            vec![minimal_input("widgets"), minimal_input("widgets")],
            BTreeMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_injection_without_protection_rule() {
        let injected = BTreeMap::from([(
            "widgets".to_owned(),
            BTreeSet::from(["gadget".to_owned()]),
        )]);
        let result = MetadataRegistry::load(hierarchy(), vec![minimal_input("widgets")], injected);
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_every_violation_at_once() {
        let mut first = minimal_input("widgets");
        first.field_access.insert(
            "name".to_owned(),
            AccessSpec::new("supervisor", "customer", "manager", "none"),
        );
        let mut second = minimal_input("gadgets");
        second.identity_field = "missing".to_owned();

        let Err(error) = MetadataRegistry::load(hierarchy(), vec![first, second], BTreeMap::new())
        else {
            unreachable!("both descriptors are invalid");
        };
        let message = error.to_string();
        assert!(message.contains("widgets"));
        assert!(message.contains("gadgets"));
    }
}
